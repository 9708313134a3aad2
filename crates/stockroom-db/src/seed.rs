//! # Development Catalog
//!
//! A small hardware-store catalog shared by the `seed` binary and the
//! backoffice `seed` command.
//!
//! ## Generated Data
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  5 departments × 4 articles × 2 packs = 40 products                    │
//! │                                                                         │
//! │  SKU        {DEPT}-{ARTICLE:02}-{PACK}       e.g. PNT-03-X3             │
//! │  Price      single: list price, X3: 3 × list less 10%                  │
//! │  Cost       55-74% of price                                             │
//! │  Stock      opening stock booked as one ADJUSTMENT_IN movement          │
//! │  Minimum    3-10                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Seeding is idempotent: SKUs already present are skipped, and customers
//! are only added to an empty catalog.

use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use stockroom_core::{Actor, NewProduct};

const DEPARTMENTS: &[(&str, &[(&str, i64)])] = &[
    (
        "FST",
        &[
            ("Wood screws 4x40 (200)", 649),
            ("Hex bolts M8 (50)", 899),
            ("Nylon wall plugs (100)", 399),
            ("Flat washers M6 (100)", 299),
        ],
    ),
    (
        "PNT",
        &[
            ("Interior emulsion white 5L", 2_499),
            ("Masking tape 25mm", 349),
            ("Roller and tray kit", 1_299),
            ("Synthetic brush set", 899),
        ],
    ),
    (
        "TLS",
        &[
            ("Claw hammer 16oz", 1_899),
            ("Tape measure 5m", 799),
            ("Snap-off utility knife", 549),
            ("Spirit level 600mm", 1_499),
        ],
    ),
    (
        "ELC",
        &[
            ("LED bulb E27 806lm", 449),
            ("Extension lead 4-way", 1_599),
            ("Cable ties 200mm (100)", 399),
            ("Plug fuses 13A (4)", 249),
        ],
    ),
    (
        "GRD",
        &[
            ("Garden hose 15m", 2_199),
            ("Bypass pruning shears", 1_399),
            ("Multipurpose compost 40L", 699),
            ("Seed tray with lid", 199),
        ],
    ),
];

/// Pack suffix, units per pack, and the pack discount in percent.
const PACKS: &[(&str, i64, i64)] = &[("X1", 1, 0), ("X3", 3, 10)];

const CUSTOMERS: &[(&str, Option<&str>)] = &[
    ("Counter Trade", None),
    ("Hillside Builders", Some("accounts@hillside-builders.example")),
];

/// What a seeding run added, plus the ledger check afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub products_added: usize,
    pub products_skipped: usize,
    pub customers_added: usize,
    pub movements: i64,
    pub discrepancies: usize,
}

/// The full catalog, in a stable order.
pub fn catalog() -> Vec<NewProduct> {
    let mut products = Vec::new();

    for (dept, articles) in DEPARTMENTS {
        for (article_idx, (name, list_price)) in articles.iter().enumerate() {
            for (pack, units, discount_pct) in PACKS {
                let n = products.len() as i64;
                let selling_price_cents = list_price * units * (100 - discount_pct) / 100;

                products.push(NewProduct {
                    sku: format!("{dept}-{:02}-{pack}", article_idx + 1),
                    name: if *units == 1 {
                        name.to_string()
                    } else {
                        format!("{name}, pack of {units}")
                    },
                    selling_price_cents,
                    cost_price_cents: selling_price_cents * (55 + (n * 7) % 20) / 100,
                    minimum_stock: 3 + n % 8,
                    opening_stock: (n * 23) % 48,
                });
            }
        }
    }

    products
}

/// Adds up to `limit` catalog products that are not there yet.
pub async fn seed_catalog(db: &Database, actor: &Actor, limit: usize) -> DbResult<SeedReport> {
    let mut report = SeedReport::default();
    let was_empty = db.products().count().await? == 0;

    for product in catalog().into_iter().take(limit) {
        if db.products().get_by_sku(&product.sku).await?.is_some() {
            report.products_skipped += 1;
            continue;
        }
        db.products().create(actor, product).await?;
        report.products_added += 1;
    }

    if was_empty {
        for (name, email) in CUSTOMERS {
            db.customers().create(name, *email).await?;
            report.customers_added += 1;
        }
    }

    report.movements = db.ledger().count().await?;
    report.discrepancies = db.ledger().verify().await?.len();

    info!(
        added = report.products_added,
        skipped = report.products_skipped,
        customers = report.customers_added,
        movements = report.movements,
        "Catalog seeded"
    );

    Ok(report)
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Stockroom Backoffice
//!
//! Operator commands over the stock ledger.
//!
//! ## Usage
//! ```bash
//! backoffice [--config FILE] <COMMAND> [ARGS]
//!
//! backoffice migrate
//! backoffice seed
//! backoffice adjust <PRODUCT_ID|SKU> <in|out> <QTY> <REASON...> --user <USER_ID>
//! backoffice low-stock
//! backoffice movements [--product ID] [--type KIND] [--user ID] [--days N] [--limit N]
//! backoffice verify
//! ```
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  parse args ─► StoreConfig::load ─► logging::init                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(db_config).with_tax_rate(config.tax_rate())             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  run command ─► close pool ─► exit code (verify: 1 on drift)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod logging;

use anyhow::{anyhow, bail, Context};
use chrono::{Duration, Utc};
use std::env;
use std::process::ExitCode;
use tracing::{info, warn};

use crate::config::StoreConfig;
use stockroom_core::{Actor, AdjustmentDirection, ManualAdjustment, Money, MovementType, Product};
use stockroom_db::seed::seed_catalog;
use stockroom_db::{migrations, Database, MovementFilter};

const USAGE: &str = "\
Usage: backoffice [--config FILE] <COMMAND> [ARGS]

Commands:
  migrate                                   Apply pending migrations
  seed                                      Load the development catalog
  adjust <PRODUCT> <in|out> <QTY> <REASON>  Manual stock correction (needs --user)
  low-stock                                 Active products at or below minimum
  movements                                 Ledger history, newest first
            [--product ID] [--type KIND] [--user ID] [--days N] [--limit N]
  verify                                    Compare stored stock with the ledger";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let config_path = take_option(&mut args, "--config")?;
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    }

    let config = StoreConfig::load(config_path.as_deref()).context("loading configuration")?;
    logging::init(&config.log);

    info!(
        store = %config.store_name,
        database = %config.database.path.display(),
        tax_rate_bps = config.default_tax_rate_bps,
        "Backoffice starting"
    );

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?
        .with_tax_rate(config.tax_rate());

    let command = args.remove(0);
    let outcome = match command.as_str() {
        "migrate" => migrate(&db).await,
        "seed" => seed(&db).await,
        "adjust" => adjust(&db, args).await,
        "low-stock" => low_stock(&db, &config).await,
        "movements" => movements(&db, args).await,
        "verify" => verify(&db).await,
        other => Err(anyhow!("unknown command `{other}`\n\n{USAGE}")),
    };

    db.close().await;
    outcome
}

// =============================================================================
// Commands
// =============================================================================

async fn migrate(db: &Database) -> anyhow::Result<ExitCode> {
    db.run_migrations().await?;
    let (total, applied) = migrations::migration_status(db.pool()).await?;
    println!("Migrations applied: {applied}/{total}");
    Ok(ExitCode::SUCCESS)
}

async fn seed(db: &Database) -> anyhow::Result<ExitCode> {
    let report = seed_catalog(db, &Actor::new("backoffice-seed")?, usize::MAX).await?;
    println!(
        "Added {} products ({} already present), {} customers",
        report.products_added, report.products_skipped, report.customers_added
    );
    if report.discrepancies > 0 {
        warn!(products = report.discrepancies, "Ledger discrepancies after seeding");
    }
    Ok(ExitCode::SUCCESS)
}

async fn adjust(db: &Database, mut args: Vec<String>) -> anyhow::Result<ExitCode> {
    let user = take_option(&mut args, "--user")?.ok_or_else(|| anyhow!("--user is required"))?;
    let actor = Actor::new(user)?;

    if args.len() < 4 {
        bail!("adjust needs <PRODUCT> <in|out> <QTY> <REASON>");
    }
    let product = resolve_product(db, &args[0]).await?;
    let direction = match args[1].to_ascii_lowercase().as_str() {
        "in" => AdjustmentDirection::In,
        "out" => AdjustmentDirection::Out,
        other => bail!("direction must be `in` or `out`, got `{other}`"),
    };
    let quantity: i64 = args[2]
        .parse()
        .with_context(|| format!("invalid quantity `{}`", args[2]))?;
    let reason = args[3..].join(" ");

    let change = db
        .adjustments()
        .adjust(
            &actor,
            ManualAdjustment {
                product_id: product.id.clone(),
                direction,
                quantity,
                reason,
            },
        )
        .await?;

    println!(
        "{} ({}): {} -> {}",
        change.product.name,
        change.product.sku,
        change.product.current_stock - change.movement.quantity,
        change.product.current_stock
    );
    if change.low_stock.is_some() {
        println!("  now at or below minimum stock ({})", change.product.minimum_stock);
    }
    Ok(ExitCode::SUCCESS)
}

async fn low_stock(db: &Database, config: &StoreConfig) -> anyhow::Result<ExitCode> {
    let products = db.products().low_stock().await?;
    if products.is_empty() {
        println!("No products at or below minimum stock");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<16} {:<32} {:>8} {:>8} {:>12}", "SKU", "NAME", "STOCK", "MIN", "PRICE");
    for p in &products {
        println!(
            "{:<16} {:<32} {:>8} {:>8} {:>12}",
            p.sku,
            p.name,
            p.current_stock,
            p.minimum_stock,
            format!("{} {}", Money::from_cents(p.selling_price_cents), config.currency),
        );
    }
    warn!(count = products.len(), "Products at or below minimum stock");
    Ok(ExitCode::SUCCESS)
}

async fn movements(db: &Database, mut args: Vec<String>) -> anyhow::Result<ExitCode> {
    let mut filter = MovementFilter::default().limit(50);

    if let Some(product) = take_option(&mut args, "--product")? {
        filter.product_id = Some(resolve_product(db, &product).await?.id);
    }
    if let Some(kind) = take_option(&mut args, "--type")? {
        let kind = MovementType::parse(&kind).ok_or_else(|| anyhow!("unknown movement type `{kind}`"))?;
        filter = filter.movement_type(kind);
    }
    if let Some(user) = take_option(&mut args, "--user")? {
        filter = filter.user(user);
    }
    if let Some(days) = take_option(&mut args, "--days")? {
        let days: i64 = days.parse().with_context(|| format!("invalid --days `{days}`"))?;
        let now = Utc::now();
        filter = filter.between(now - Duration::days(days), now + Duration::seconds(1));
    }
    if let Some(limit) = take_option(&mut args, "--limit")? {
        filter = filter.limit(limit.parse().with_context(|| format!("invalid --limit `{limit}`"))?);
    }

    let records = db.ledger().query(&filter).await?;
    for m in &records {
        println!(
            "{}  {:<15} {:>6}  {:<12} {}  {}",
            m.created_at.format("%Y-%m-%d %H:%M:%S"),
            m.movement_type,
            m.quantity,
            m.user_id,
            m.product_id,
            m.reason.as_deref().unwrap_or("-"),
        );
    }
    println!("{} movement(s)", records.len());
    Ok(ExitCode::SUCCESS)
}

async fn verify(db: &Database) -> anyhow::Result<ExitCode> {
    let drift = db.ledger().verify().await?;
    if drift.is_empty() {
        println!("Ledger consistent: {} movements", db.ledger().count().await?);
        return Ok(ExitCode::SUCCESS);
    }

    for d in &drift {
        println!(
            "{} ({}): stored {} ledger {}",
            d.name, d.product_id, d.current_stock, d.ledger_stock
        );
    }
    warn!(products = drift.len(), "Ledger discrepancies found");
    Ok(ExitCode::from(1))
}

// =============================================================================
// Helpers
// =============================================================================

/// Accepts an id or a SKU.
async fn resolve_product(db: &Database, reference: &str) -> anyhow::Result<Product> {
    if let Some(product) = db.products().get_by_id(reference).await? {
        return Ok(product);
    }
    db.products()
        .get_by_sku(reference)
        .await?
        .ok_or_else(|| anyhow!("no product with id or SKU `{reference}`"))
}

/// Removes `--name VALUE` from `args`.
fn take_option(args: &mut Vec<String>, name: &str) -> anyhow::Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("{name} needs a value");
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::take_option;

    #[test]
    fn test_take_option() {
        let mut args: Vec<String> = ["adjust", "--user", "u1", "SKU-1"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(take_option(&mut args, "--user").unwrap().as_deref(), Some("u1"));
        assert_eq!(args, vec!["adjust", "SKU-1"]);
        assert!(take_option(&mut args, "--limit").unwrap().is_none());

        args.push("--limit".into());
        assert!(take_option(&mut args, "--limit").is_err());
    }
}

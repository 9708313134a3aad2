//! # Sale Service
//!
//! Creates and cancels sales. A sale, its items and one SALE_EXIT movement
//! per line commit together or not at all.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate command ─► BadRequest                                         │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │  customer exists?  ─────────────────────────► NotFound                  │
//! │  per product: exists? active? stock ≥ Σ qty? ► NotFound / Conflict      │
//! │       │                                                                 │
//! │  price lines (snapshot), totals                                         │
//! │  INSERT sale, INSERT items                                              │
//! │  StockMutator::adjust(−qty, SALE_EXIT, sale_id) per line                │
//! │       │                                                                 │
//! │  COMMIT ─► low-stock alerts                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::notify::{dispatch, SharedObserver};
use crate::repository::{customer, product, returns, sale};
use crate::service::finish;
use crate::stock::{StockAdjustment, StockMutator};
use stockroom_core::pricing::{price_lines, PricedLine, SaleDiscount};
use stockroom_core::returns::{ensure_completed, restorable};
use stockroom_core::stock::insufficient_stock;
use stockroom_core::validation::validate_create_sale;
use stockroom_core::{
    Actor, BasisPoints, CoreError, Correlation, CreateSale, LowStockAlert, MovementType, Sale,
    SaleDetail, SaleItem, SaleStatus,
};

#[derive(Clone)]
pub struct SaleService {
    pool: SqlitePool,
    observer: SharedObserver,
    tax_rate: BasisPoints,
}

impl SaleService {
    pub fn new(pool: SqlitePool, observer: SharedObserver, tax_rate: BasisPoints) -> Self {
        SaleService {
            pool,
            observer,
            tax_rate,
        }
    }

    /// Records a completed sale and takes its stock.
    pub async fn create(&self, actor: &Actor, request: CreateSale) -> DbResult<SaleDetail> {
        validate_create_sale(&request)?;
        let discount = SaleDiscount::from_input(request.discount.as_ref())?;

        let mut tx = self.pool.begin().await?;
        let outcome = create_in(&mut tx, actor, &request, &discount, self.tax_rate).await;
        let (detail, alerts) = finish(tx, outcome, "sale.create").await?;

        info!(
            sale_id = %detail.sale.id,
            receipt = %detail.sale.receipt_number,
            lines = detail.items.len(),
            total_cents = detail.sale.total_cents,
            "Sale completed"
        );
        dispatch(self.observer.as_ref(), &alerts);
        Ok(detail)
    }

    /// Cancels a completed sale, restoring whatever was not returned.
    pub async fn cancel(&self, actor: &Actor, sale_id: &str) -> DbResult<SaleDetail> {
        let mut tx = self.pool.begin().await?;
        let outcome = cancel_in(&mut tx, actor, sale_id).await;
        let (detail, alerts) = finish(tx, outcome, "sale.cancel").await?;

        info!(sale_id = %sale_id, "Sale cancelled");
        dispatch(self.observer.as_ref(), &alerts);
        Ok(detail)
    }

    pub async fn get(&self, sale_id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;
        sale::fetch_detail(&mut conn, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;
        sale::list_recent(&mut conn, limit).await
    }
}

async fn create_in(
    conn: &mut SqliteConnection,
    actor: &Actor,
    request: &CreateSale,
    discount: &SaleDiscount,
    tax_rate: BasisPoints,
) -> DbResult<(SaleDetail, Vec<LowStockAlert>)> {
    if let Some(customer_id) = &request.customer_id {
        if !customer::exists(&mut *conn, customer_id).await? {
            return Err(CoreError::CustomerNotFound(customer_id.clone()).into());
        }
    }

    // Itemized pre-check. Repeated products are checked against their total.
    let mut priced: Vec<PricedLine> = Vec::with_capacity(request.lines.len());
    for line in &request.lines {
        let item = product::require(&mut *conn, &line.product_id).await?;

        if !item.is_active {
            return Err(CoreError::ProductInactive {
                product_id: item.id.clone(),
                name: item.name.clone(),
            }
            .into());
        }

        let required: i64 = request
            .lines
            .iter()
            .filter(|other| other.product_id == line.product_id)
            .map(|other| other.quantity)
            .sum();
        if item.current_stock < required {
            return Err(insufficient_stock(&item, required, item.current_stock).into());
        }

        priced.push(PricedLine::from_product(&item, line.quantity)?);
    }

    let totals = price_lines(&priced, discount, tax_rate)?;

    let now = Utc::now();
    let sale_uuid = Uuid::new_v4();
    let header = Sale {
        id: sale_uuid.to_string(),
        receipt_number: sale::generate_receipt_number(&sale_uuid, now),
        user_id: actor.user_id().to_string(),
        customer_id: request.customer_id.clone(),
        payment_method: request.payment_method,
        status: SaleStatus::Completed,
        subtotal_cents: totals.subtotal.cents(),
        discount_percent_bps: discount.percent.bps(),
        discount_amount_cents: discount.amount.cents(),
        discount_cents: totals.discount.cents(),
        tax_rate_bps: tax_rate.bps(),
        tax_cents: totals.tax.cents(),
        total_cents: totals.total.cents(),
        notes: request.notes.clone(),
        created_at: now,
        updated_at: now,
        cancelled_at: None,
    };
    sale::insert_sale(&mut *conn, &header).await?;

    let mut items = Vec::with_capacity(priced.len());
    for line in &priced {
        let item = SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: header.id.clone(),
            product_id: line.product_id.clone(),
            sku_snapshot: line.sku.clone(),
            name_snapshot: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            item_subtotal_cents: line.item_subtotal.cents(),
            item_total_cents: line.item_subtotal.cents(),
            created_at: now,
        };
        sale::insert_item(&mut *conn, &item).await?;
        items.push(item);
    }

    let mut alerts = Vec::new();
    for line in &priced {
        let change = StockMutator::adjust(
            &mut *conn,
            actor,
            StockAdjustment::new(&line.product_id, -line.quantity, MovementType::SaleExit)
                .reason(format!("Sale {}", header.receipt_number))
                .correlation(Correlation::sale(&header.id)),
        )
        .await?;
        alerts.extend(change.low_stock);
    }

    debug!(sale_id = %header.id, subtotal = %totals.subtotal, total = %totals.total, "Sale priced");
    Ok((SaleDetail { sale: header, items }, alerts))
}

async fn cancel_in(
    conn: &mut SqliteConnection,
    actor: &Actor,
    sale_id: &str,
) -> DbResult<(SaleDetail, Vec<LowStockAlert>)> {
    let detail = sale::fetch_detail(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
    ensure_completed(&detail.sale)?;

    let returned = returns::returned_quantities(&mut *conn, sale_id).await?;

    let mut alerts = Vec::new();
    for (product_id, quantity) in restorable(&detail, &returned) {
        let change = StockMutator::adjust(
            &mut *conn,
            actor,
            StockAdjustment::new(product_id, quantity, MovementType::AdjustmentIn)
                .reason(format!("Sale {sale_id} cancelled"))
                .correlation(Correlation::sale(sale_id)),
        )
        .await?;
        alerts.extend(change.low_stock);
    }

    let now = Utc::now();
    sale::mark_cancelled(&mut *conn, sale_id, now).await?;

    let mut detail = detail;
    detail.sale.status = SaleStatus::Cancelled;
    detail.sale.cancelled_at = Some(now);
    detail.sale.updated_at = now;
    Ok((detail, alerts))
}

// =============================================================================
// Unit Tests
// =============================================================================

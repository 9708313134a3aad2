//! # Sale Persistence
//!
//! Row-level reads and writes for sales and their items. Every function
//! runs on the caller's connection so the sale service can compose them
//! into one transaction with the stock mutator.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                         sale_items                            │
//! │  ┌───────────────────────┐        ┌──────────────────────────────────┐  │
//! │  │ sku   WIDGET          │──copy─►│ sku_snapshot   WIDGET            │  │
//! │  │ name  Widget          │──copy─►│ name_snapshot  Widget            │  │
//! │  │ price 10.00           │──copy─►│ unit_price     10.00             │  │
//! │  └───────────────────────┘        │ quantity       3                 │  │
//! │                                   │ item_subtotal  30.00             │  │
//! │  Later price changes do not       └──────────────────────────────────┘  │
//! │  rewrite history.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::DbResult;
use stockroom_core::{Sale, SaleDetail, SaleItem, SaleStatus};

const SELECT_SALE: &str = "SELECT id, receipt_number, user_id, customer_id, payment_method, status, \
     subtotal_cents, discount_percent_bps, discount_amount_cents, discount_cents, tax_rate_bps, \
     tax_cents, total_cents, notes, created_at, updated_at, cancelled_at FROM sales";

pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, receipt_number, user_id, customer_id, payment_method, status,
            subtotal_cents, discount_percent_bps, discount_amount_cents, discount_cents,
            tax_rate_bps, tax_cents, total_cents, notes, created_at, updated_at, cancelled_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.receipt_number)
    .bind(&sale.user_id)
    .bind(&sale.customer_id)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_percent_bps)
    .bind(sale.discount_amount_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_rate_bps)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(sale.cancelled_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, sku_snapshot, name_snapshot, quantity,
            unit_price_cents, item_subtotal_cents, item_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.sku_snapshot)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.item_subtotal_cents)
    .bind(item.item_total_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_detail(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<Option<SaleDetail>> {
    let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE id = ?1"))
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(sale) = sale else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, sale_id, product_id, sku_snapshot, name_snapshot, quantity,
               unit_price_cents, item_subtotal_cents, item_total_cents, created_at
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(SaleDetail { sale, items }))
}

pub(crate) async fn list_recent(conn: &mut SqliteConnection, limit: u32) -> DbResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(&format!(
        "{SELECT_SALE} ORDER BY created_at DESC, rowid DESC LIMIT ?1"
    ))
    .bind(i64::from(limit))
    .fetch_all(&mut *conn)
    .await?;
    Ok(sales)
}

pub(crate) async fn mark_cancelled(
    conn: &mut SqliteConnection,
    sale_id: &str,
    at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query("UPDATE sales SET status = ?1, cancelled_at = ?2, updated_at = ?2 WHERE id = ?3")
        .bind(SaleStatus::Cancelled)
        .bind(at)
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Human-readable receipt number: `S-YYYYMMDD-XXXXXXXX`.
pub fn generate_receipt_number(sale_id: &uuid::Uuid, at: DateTime<Utc>) -> String {
    let suffix = sale_id.simple().to_string();
    format!(
        "S-{}-{}",
        at.format("%Y%m%d"),
        suffix[..8].to_uppercase()
    )
}

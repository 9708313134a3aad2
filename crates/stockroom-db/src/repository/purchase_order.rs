//! # Purchase Order Persistence
//!
//! Row-level reads and writes for purchase orders and their items, run on
//! the caller's connection.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::DbResult;
use stockroom_core::{PurchaseOrder, PurchaseOrderDetail, PurchaseOrderItem, PurchaseOrderStatus};

pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &PurchaseOrder) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO purchase_orders (
            id, supplier_id, status, total_cents, created_by_user_id, notes,
            created_at, updated_at, received_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&order.id)
    .bind(&order.supplier_id)
    .bind(order.status)
    .bind(order.total_cents)
    .bind(&order.created_by_user_id)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.received_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_item(
    conn: &mut SqliteConnection,
    item: &PurchaseOrderItem,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO purchase_order_items (
            id, purchase_order_id, product_id, quantity_ordered, quantity_received,
            unit_cost_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&item.id)
    .bind(&item.purchase_order_id)
    .bind(&item.product_id)
    .bind(item.quantity_ordered)
    .bind(item.quantity_received)
    .bind(item.unit_cost_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Option<PurchaseOrder>> {
    let order = sqlx::query_as::<_, PurchaseOrder>(
        r#"
        SELECT id, supplier_id, status, total_cents, created_by_user_id, notes,
               created_at, updated_at, received_at
        FROM purchase_orders
        WHERE id = ?1
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

pub(crate) async fn fetch_items(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<PurchaseOrderItem>> {
    let items = sqlx::query_as::<_, PurchaseOrderItem>(
        r#"
        SELECT id, purchase_order_id, product_id, quantity_ordered, quantity_received,
               unit_cost_cents, created_at
        FROM purchase_order_items
        WHERE purchase_order_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

pub(crate) async fn fetch_detail(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Option<PurchaseOrderDetail>> {
    let Some(order) = fetch_order(&mut *conn, order_id).await? else {
        return Ok(None);
    };
    let items = fetch_items(&mut *conn, order_id).await?;
    Ok(Some(PurchaseOrderDetail { order, items }))
}

/// Writes the new running total for one item.
pub(crate) async fn set_received(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity_received: i64,
) -> DbResult<()> {
    sqlx::query("UPDATE purchase_order_items SET quantity_received = ?1 WHERE id = ?2")
        .bind(quantity_received)
        .bind(item_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    order_id: &str,
    status: PurchaseOrderStatus,
    received_at: Option<DateTime<Utc>>,
    at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE purchase_orders SET status = ?1, received_at = ?2, updated_at = ?3 WHERE id = ?4",
    )
    .bind(status)
    .bind(received_at)
    .bind(at)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

//! # Return Persistence
//!
//! Return headers, their items, and the per-sale aggregates the return
//! rules need (quantities already returned, refunds already paid).

use sqlx::SqliteConnection;

use crate::error::DbResult;
use stockroom_core::returns::ReturnedQuantities;
use stockroom_core::{Money, ReturnDetail, ReturnItem, SaleReturn};

pub(crate) async fn insert_return(conn: &mut SqliteConnection, ret: &SaleReturn) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO returns (
            id, original_sale_id, processed_by_user_id, reason, refunded_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&ret.id)
    .bind(&ret.original_sale_id)
    .bind(&ret.processed_by_user_id)
    .bind(&ret.reason)
    .bind(ret.refunded_cents)
    .bind(ret.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &ReturnItem) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO return_items (id, return_id, product_id, quantity, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&item.id)
    .bind(&item.return_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Quantity already returned per product on `sale_id`.
pub(crate) async fn returned_quantities(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<ReturnedQuantities> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT ri.product_id, SUM(ri.quantity)
        FROM return_items ri
        JOIN returns r ON r.id = ri.return_id
        WHERE r.original_sale_id = ?1
        GROUP BY ri.product_id
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().collect())
}

pub(crate) async fn refunded_total(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(refunded_cents), 0) FROM returns WHERE original_sale_id = ?1",
    )
    .bind(sale_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_cents(cents))
}

pub(crate) async fn fetch_detail(
    conn: &mut SqliteConnection,
    return_id: &str,
) -> DbResult<Option<ReturnDetail>> {
    let sale_return = sqlx::query_as::<_, SaleReturn>(
        r#"
        SELECT id, original_sale_id, processed_by_user_id, reason, refunded_cents, created_at
        FROM returns
        WHERE id = ?1
        "#,
    )
    .bind(return_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(sale_return) = sale_return else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, ReturnItem>(
        r#"
        SELECT id, return_id, product_id, quantity, created_at
        FROM return_items
        WHERE return_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(return_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(ReturnDetail { sale_return, items }))
}

pub(crate) async fn ids_for_sale(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT id FROM returns WHERE original_sale_id = ?1 ORDER BY created_at, rowid",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

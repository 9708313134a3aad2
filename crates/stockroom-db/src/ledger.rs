//! # Movement Ledger
//!
//! Append-only log of every stock change.
//!
//! ## Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   for every product p:                                                  │
//! │                                                                         │
//! │       Σ stock_movements.quantity WHERE product_id = p                   │
//! │                       ==                                                │
//! │       products.current_stock WHERE id = p                               │
//! │                                                                         │
//! │   Appends happen only from the stock mutator, inside the same           │
//! │   transaction that writes current_stock. SQLite triggers abort any      │
//! │   UPDATE or DELETE on stock_movements.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{LedgerDiscrepancy, MovementRecord, MovementType};

const MOVEMENT_COLUMNS: &str = "id, product_id, quantity, movement_type, user_id, reason, \
     sale_id, purchase_order_id, return_id, created_at";

/// Writes one record inside the caller's transaction.
///
/// Only the stock mutator calls this.
pub(crate) async fn append(
    conn: &mut SqliteConnection,
    record: MovementRecord,
) -> DbResult<MovementRecord> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, quantity, movement_type, user_id, reason,
            sale_id, purchase_order_id, return_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&record.id)
    .bind(&record.product_id)
    .bind(record.quantity)
    .bind(record.movement_type)
    .bind(&record.user_id)
    .bind(&record.reason)
    .bind(&record.sale_id)
    .bind(&record.purchase_order_id)
    .bind(&record.return_id)
    .bind(record.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        movement_id = %record.id,
        product_id = %record.product_id,
        quantity = record.quantity,
        movement_type = %record.movement_type,
        "Movement appended"
    );

    Ok(record)
}

pub(crate) async fn balance(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
    let sum: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM stock_movements WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(sum)
}

// =============================================================================
// Queries
// =============================================================================

/// Filter for [`MovementLedger::query`]. Empty fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementFilter {
    pub product_id: Option<String>,
    pub user_id: Option<String>,
    pub movement_type: Option<MovementType>,
    pub sale_id: Option<String>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl MovementFilter {
    pub fn for_product(product_id: impl Into<String>) -> Self {
        MovementFilter {
            product_id: Some(product_id.into()),
            ..MovementFilter::default()
        }
    }

    pub fn for_sale(sale_id: impl Into<String>) -> Self {
        MovementFilter {
            sale_id: Some(sale_id.into()),
            ..MovementFilter::default()
        }
    }

    pub fn movement_type(mut self, kind: MovementType) -> Self {
        self.movement_type = Some(kind);
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read access to the ledger.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.ledger();
/// let history = ledger.query(&MovementFilter::for_product(&id).limit(50)).await?;
/// let drift = ledger.verify().await?;
/// ```
#[derive(Debug, Clone)]
pub struct MovementLedger {
    pool: SqlitePool,
}

impl MovementLedger {
    pub fn new(pool: SqlitePool) -> Self {
        MovementLedger { pool }
    }

    /// Matching records, newest first.
    pub async fn query(&self, filter: &MovementFilter) -> DbResult<Vec<MovementRecord>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        builder.push(MOVEMENT_COLUMNS);
        builder.push(" FROM stock_movements WHERE 1 = 1");

        if let Some(product_id) = &filter.product_id {
            builder.push(" AND product_id = ").push_bind(product_id.clone());
        }
        if let Some(user_id) = &filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id.clone());
        }
        if let Some(kind) = filter.movement_type {
            builder.push(" AND movement_type = ").push_bind(kind);
        }
        if let Some(sale_id) = &filter.sale_id {
            builder.push(" AND sale_id = ").push_bind(sale_id.clone());
        }
        if let Some(from) = filter.from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND created_at < ").push_bind(to);
        }

        builder.push(" ORDER BY created_at DESC, rowid DESC");

        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let records = builder
            .build_query_as::<MovementRecord>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), "Ledger query returned movements");
        Ok(records)
    }

    /// Stock implied by the ledger alone.
    pub async fn stock_from_ledger(&self, product_id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        balance(&mut conn, product_id).await
    }

    /// Products whose stored stock disagrees with their ledger sum.
    pub async fn verify(&self) -> DbResult<Vec<LedgerDiscrepancy>> {
        let rows = sqlx::query_as::<_, LedgerDiscrepancy>(
            r#"
            SELECT p.id AS product_id,
                   p.name,
                   p.current_stock,
                   COALESCE(SUM(m.quantity), 0) AS ledger_stock
            FROM products p
            LEFT JOIN stock_movements m ON m.product_id = p.id
            GROUP BY p.id, p.name, p.current_stock
            HAVING p.current_stock <> COALESCE(SUM(m.quantity), 0)
            ORDER BY p.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

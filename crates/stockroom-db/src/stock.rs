//! # Stock Mutator
//!
//! The only code path that writes `products.current_stock`.
//!
//! ## One Call, One Product, One Movement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StockMutator::adjust(conn, actor, adjustment)                          │
//! │                                                                         │
//! │   1. load product through `conn` (sees the caller's uncommitted rows)   │
//! │   2. stock::plan_transition  ──► NotFound / InsufficientStock / ...     │
//! │   3. ledger::append          ──► one MovementRecord                     │
//! │   4. guarded UPDATE ... RETURNING current_stock                         │
//! │        guard: floor-enforcing kinds need current_stock + delta >= 0     │
//! │        miss:  re-read, InsufficientStock with fresh availability        │
//! │   5. low-stock edge ──► alert handed back to the caller                 │
//! │                                                                         │
//! │  The caller owns the transaction and decides when alerts go out.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::product;
use crate::ledger;
use stockroom_core::stock::{crosses_low_stock, insufficient_stock, low_stock_alert, plan_transition};
use stockroom_core::{
    Actor, CoreError, Correlation, LowStockAlert, MovementRecord, MovementType, Product,
    StockTransition,
};

/// A requested stock change for one product.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub product_id: String,
    /// Signed; must agree with the direction of `movement_type`.
    pub delta: i64,
    pub movement_type: MovementType,
    pub reason: Option<String>,
    pub correlation: Correlation,
}

impl StockAdjustment {
    pub fn new(product_id: impl Into<String>, delta: i64, movement_type: MovementType) -> Self {
        StockAdjustment {
            product_id: product_id.into(),
            delta,
            movement_type,
            reason: None,
            correlation: Correlation::none(),
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn correlation(mut self, correlation: Correlation) -> Self {
        self.correlation = correlation;
        self
    }
}

/// Result of an applied adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct StockChange {
    /// The product as written.
    pub product: Product,
    pub movement: MovementRecord,
    /// Set only when this change crossed the minimum-stock threshold.
    pub low_stock: Option<LowStockAlert>,
}

/// Validates, records and applies stock deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockMutator;

impl StockMutator {
    /// Applies one adjustment inside the caller's unit of work.
    ///
    /// Nothing is committed here. On error the caller must roll back; the
    /// movement may already have been appended.
    pub async fn adjust(
        conn: &mut SqliteConnection,
        actor: &Actor,
        adjustment: StockAdjustment,
    ) -> DbResult<StockChange> {
        let loaded = product::fetch(&mut *conn, &adjustment.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(adjustment.product_id.clone()))?;

        plan_transition(&loaded, adjustment.delta, adjustment.movement_type)?;

        let now = Utc::now();
        let movement = ledger::append(
            &mut *conn,
            MovementRecord {
                id: Uuid::new_v4().to_string(),
                product_id: loaded.id.clone(),
                quantity: adjustment.delta,
                movement_type: adjustment.movement_type,
                user_id: actor.user_id().to_string(),
                reason: adjustment.reason,
                sale_id: adjustment.correlation.sale_id,
                purchase_order_id: adjustment.correlation.purchase_order_id,
                return_id: adjustment.correlation.return_id,
                created_at: now,
            },
        )
        .await?;

        let written: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET current_stock = current_stock + ?1,
                updated_at = ?2
            WHERE id = ?3
              AND (?4 = 0 OR current_stock + ?1 >= 0)
            RETURNING current_stock
            "#,
        )
        .bind(adjustment.delta)
        .bind(now)
        .bind(&loaded.id)
        .bind(adjustment.movement_type.enforces_floor())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(new_stock) = written else {
            return Err(Self::guard_miss(conn, &loaded, adjustment.delta).await);
        };

        let transition = StockTransition {
            previous: new_stock - adjustment.delta,
            new: new_stock,
            delta: adjustment.delta,
            crossed_low_stock: crosses_low_stock(
                new_stock - adjustment.delta,
                new_stock,
                loaded.minimum_stock,
            ),
        };

        let product = Product {
            current_stock: new_stock,
            updated_at: now,
            ..loaded
        };
        let low_stock = low_stock_alert(&product, &transition);

        debug!(
            product_id = %product.id,
            delta = adjustment.delta,
            movement_type = %adjustment.movement_type,
            previous_stock = transition.previous,
            new_stock,
            "Stock adjusted"
        );

        Ok(StockChange {
            product,
            movement,
            low_stock,
        })
    }

    /// The guarded update matched no row: the product vanished or another
    /// writer drained it after our read.
    async fn guard_miss(conn: &mut SqliteConnection, loaded: &Product, delta: i64) -> crate::DbError {
        match product::fetch(&mut *conn, &loaded.id).await {
            Ok(Some(fresh)) => insufficient_stock(&fresh, -delta, fresh.current_stock).into(),
            Ok(None) => CoreError::ProductNotFound(loaded.id.clone()).into(),
            Err(err) => err,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

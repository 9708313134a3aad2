//! # Manual Adjustments
//!
//! Counted corrections entered by staff: damage, shrinkage, found stock.
//! Each one is a single ADJUSTMENT_IN or ADJUSTMENT_OUT movement with a
//! mandatory reason.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::notify::{dispatch, SharedObserver};
use crate::service::finish;
use crate::stock::{StockAdjustment, StockChange, StockMutator};
use stockroom_core::validation::{validate_manual_adjustment, validate_reason};
use stockroom_core::{Actor, ManualAdjustment};

#[derive(Clone)]
pub struct AdjustmentService {
    pool: SqlitePool,
    observer: SharedObserver,
}

impl AdjustmentService {
    pub fn new(pool: SqlitePool, observer: SharedObserver) -> Self {
        AdjustmentService { pool, observer }
    }

    pub async fn adjust(&self, actor: &Actor, request: ManualAdjustment) -> DbResult<StockChange> {
        validate_manual_adjustment(&request)?;
        let reason = validate_reason(&request.reason)?;

        let adjustment = StockAdjustment::new(
            request.product_id,
            request.direction.signed(request.quantity),
            request.direction.movement_type(),
        )
        .reason(reason);

        let mut tx = self.pool.begin().await?;
        let outcome = StockMutator::adjust(&mut tx, actor, adjustment).await;
        let change = finish(tx, outcome, "stock.adjust").await?;

        info!(
            product_id = %change.product.id,
            movement_type = %change.movement.movement_type,
            quantity = change.movement.quantity,
            current_stock = change.product.current_stock,
            user_id = %actor.user_id(),
            "Manual adjustment recorded"
        );
        if let Some(alert) = &change.low_stock {
            dispatch(self.observer.as_ref(), std::slice::from_ref(alert));
        }
        Ok(change)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

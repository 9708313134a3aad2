//! # Stock Rules
//!
//! The pure half of the stock mutator: given a product and a signed delta,
//! decide whether the move is allowed and what it produces.
//!
//! ## Transition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plan_transition(product, delta, kind)                                 │
//! │                                                                         │
//! │   delta == 0 or sign ≠ kind.direction ──► MovementDirectionMismatch     │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │   new = current + delta (overflow ──► StockOverflow)                    │
//! │                    │                                                    │
//! │   new < 0 && kind.enforces_floor ─────► InsufficientStock               │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │   previous > minimum && new <= minimum ─► LowStockAlert (edge only)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inbound kinds skip the floor check entirely.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{MovementType, Product};

/// Outcome of an allowed stock move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockTransition {
    pub previous: i64,
    pub new: i64,
    pub delta: i64,
    /// The move crossed the minimum-stock threshold downward.
    pub crossed_low_stock: bool,
}

/// Raised when a product's stock first reaches its minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockAlert {
    pub product_id: String,
    pub product_name: String,
    pub previous_stock: i64,
    pub current_stock: i64,
    pub minimum_stock: i64,
}

/// True only on the downward crossing edge.
///
/// ```rust
/// use stockroom_core::stock::crosses_low_stock;
///
/// assert!(crosses_low_stock(6, 5, 5));
/// assert!(!crosses_low_stock(5, 4, 5)); // already at or below
/// assert!(!crosses_low_stock(4, 6, 5)); // moving up
/// ```
#[inline]
pub fn crosses_low_stock(previous: i64, new: i64, minimum: i64) -> bool {
    previous > minimum && new <= minimum
}

/// Decides whether `delta` may be applied to `product` as a `kind` movement.
pub fn plan_transition(
    product: &Product,
    delta: i64,
    kind: MovementType,
) -> CoreResult<StockTransition> {
    if !kind.accepts_delta(delta) {
        return Err(CoreError::MovementDirectionMismatch {
            movement_type: kind,
            delta,
        });
    }

    let previous = product.current_stock;
    let new = previous
        .checked_add(delta)
        .ok_or_else(|| CoreError::StockOverflow {
            product_id: product.id.clone(),
            current: previous,
            delta,
        })?;

    if new < 0 && kind.enforces_floor() {
        return Err(insufficient_stock(product, -delta, previous));
    }

    Ok(StockTransition {
        previous,
        new,
        delta,
        crossed_low_stock: crosses_low_stock(previous, new, product.minimum_stock),
    })
}

/// Builds the alert for a transition that crossed the threshold.
pub fn low_stock_alert(product: &Product, transition: &StockTransition) -> Option<LowStockAlert> {
    transition.crossed_low_stock.then(|| LowStockAlert {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        previous_stock: transition.previous,
        current_stock: transition.new,
        minimum_stock: product.minimum_stock,
    })
}

pub fn insufficient_stock(product: &Product, required: i64, available: i64) -> CoreError {
    CoreError::InsufficientStock {
        product_id: product.id.clone(),
        name: product.name.clone(),
        required,
        available,
    }
}

/// Sum of signed ledger quantities.
pub fn ledger_balance<I>(quantities: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    quantities.into_iter().sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn product(stock: i64, minimum: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            sku: "WIDGET".to_string(),
            name: "Widget".to_string(),
            selling_price_cents: 1000,
            cost_price_cents: 600,
            current_stock: stock,
            minimum_stock: minimum,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sale_exit_within_stock() {
        let t = plan_transition(&product(10, 2), -3, MovementType::SaleExit).unwrap();
        assert_eq!(t.previous, 10);
        assert_eq!(t.new, 7);
        assert!(!t.crossed_low_stock);
    }

    #[test]
    fn test_inbound_overflow_is_rejected() {
        let err = plan_transition(&product(5, 0), i64::MAX, MovementType::AdjustmentIn).unwrap_err();
        assert!(matches!(
            err,
            CoreError::StockOverflow {
                current: 5,
                delta: i64::MAX,
                ..
            }
        ));
        assert_eq!(err.kind(), crate::error::ErrorKind::BadRequest);
    }

    #[test]
    fn test_sale_exit_beyond_stock_is_rejected() {
        let err = plan_transition(&product(3, 0), -5, MovementType::SaleExit).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                required,
                available,
                ..
            } => {
                assert_eq!(required, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_exit_to_exactly_zero_is_allowed() {
        let t = plan_transition(&product(4, 0), -4, MovementType::AdjustmentOut).unwrap();
        assert_eq!(t.new, 0);
        assert!(t.crossed_low_stock);
    }

    #[test]
    fn test_direction_mismatch() {
        assert!(matches!(
            plan_transition(&product(4, 0), 2, MovementType::SaleExit),
            Err(CoreError::MovementDirectionMismatch { .. })
        ));
        assert!(matches!(
            plan_transition(&product(4, 0), 0, MovementType::PurchaseEntry),
            Err(CoreError::MovementDirectionMismatch { .. })
        ));
        assert!(matches!(
            plan_transition(&product(4, 0), -1, MovementType::CustomerReturn),
            Err(CoreError::MovementDirectionMismatch { .. })
        ));
    }

    #[test]
    fn test_low_stock_fires_on_crossing_only() {
        // 10 → 5 with minimum 5: crosses
        let p = product(10, 5);
        let t = plan_transition(&p, -5, MovementType::SaleExit).unwrap();
        let alert = low_stock_alert(&p, &t).unwrap();
        assert_eq!(alert.current_stock, 5);
        assert_eq!(alert.previous_stock, 10);

        // 5 → 4: already at threshold, no alert
        let p = product(5, 5);
        let t = plan_transition(&p, -1, MovementType::SaleExit).unwrap();
        assert!(low_stock_alert(&p, &t).is_none());

        // inbound never crosses downward
        let p = product(2, 5);
        let t = plan_transition(&p, 10, MovementType::PurchaseEntry).unwrap();
        assert!(low_stock_alert(&p, &t).is_none());
    }

    fn movement_strategy() -> impl Strategy<Value = (MovementType, i64)> {
        (0usize..5, 1i64..50).prop_map(|(idx, qty)| {
            let kind = MovementType::ALL[idx];
            let delta = if kind.accepts_delta(qty) { qty } else { -qty };
            (kind, delta)
        })
    }

    proptest! {
        /// Replaying any sequence of requested movements keeps the applied
        /// ledger equal to stock and never drives stock below zero.
        #[test]
        fn prop_ledger_matches_stock_and_never_negative(
            minimum in 0i64..20,
            moves in proptest::collection::vec(movement_strategy(), 0..200),
        ) {
            let mut p = product(0, minimum);
            let mut ledger = Vec::new();
            let mut alerts = 0usize;
            let mut expected_alerts = 0usize;

            for (kind, delta) in moves {
                let before = p.current_stock;
                match plan_transition(&p, delta, kind) {
                    Ok(t) => {
                        prop_assert_eq!(t.previous, before);
                        ledger.push(t.delta);
                        p.current_stock = t.new;
                        if low_stock_alert(&p, &t).is_some() {
                            alerts += 1;
                        }
                        if before > minimum && t.new <= minimum {
                            expected_alerts += 1;
                        }
                    }
                    Err(CoreError::InsufficientStock { required, available, .. }) => {
                        prop_assert!(kind.enforces_floor());
                        prop_assert_eq!(available, before);
                        prop_assert!(required > available);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
                prop_assert!(p.current_stock >= 0);
                prop_assert_eq!(ledger_balance(ledger.iter().copied()), p.current_stock);
            }

            prop_assert_eq!(alerts, expected_alerts);
        }
    }
}

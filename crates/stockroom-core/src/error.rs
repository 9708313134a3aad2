//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures + Domain(CoreError)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → transport status        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Kinds
//!
//! Every error maps onto one [`ErrorKind`]. Transports turn the kind into a
//! status code (404, 409, 400, 500); nothing in this workspace does.
//!
//! | Kind         | Meaning                                              |
//! |--------------|------------------------------------------------------|
//! | `NotFound`   | A referenced entity does not exist                   |
//! | `Conflict`   | The request is well-formed but the state forbids it  |
//! | `BadRequest` | The request itself is malformed or out of bounds     |
//! | `Internal`   | Storage failure (only produced by stockroom-db)      |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;
use crate::types::{MovementType, PurchaseOrderStatus, SaleStatus};

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse error taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BadRequest,
    Internal,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Any of these aborts the enclosing transaction; nothing is partially
/// applied.
#[derive(Debug, Error)]
pub enum CoreError {
    // ---- NotFound -----------------------------------------------------------
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("Return not found: {0}")]
    ReturnNotFound(String),

    #[error("Purchase order not found: {0}")]
    PurchaseOrderNotFound(String),

    /// A receipt line references neither an item id nor a product id of
    /// this order.
    #[error("Purchase order {order_id} has no item matching {reference}")]
    PurchaseOrderItemNotFound { order_id: String, reference: String },

    // ---- Conflict -----------------------------------------------------------
    /// Not enough stock for a stock-constrained movement.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell 5 × Widget
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Widget", available: 3, required: 5 }
    ///      │
    ///      ▼
    /// Operator sees: "Insufficient stock for Widget: required 5, available 3"
    /// ```
    #[error("Insufficient stock for {name} ({product_id}): required {required}, available {available}")]
    InsufficientStock {
        product_id: String,
        name: String,
        required: i64,
        available: i64,
    },

    #[error("Product {name} ({product_id}) is inactive")]
    ProductInactive { product_id: String, name: String },

    #[error("Sale {sale_id} is {status}, cannot perform operation")]
    InvalidSaleStatus { sale_id: String, status: SaleStatus },

    #[error("Purchase order {order_id} is {status}, cannot perform operation")]
    PurchaseOrderClosed {
        order_id: String,
        status: PurchaseOrderStatus,
    },

    // ---- BadRequest ---------------------------------------------------------
    #[error("Cannot receive {receiving} of item {item_id}: ordered {ordered}, already received {already_received}")]
    OverReceipt {
        item_id: String,
        product_id: String,
        ordered: i64,
        already_received: i64,
        receiving: i64,
    },

    #[error("Received quantity for item {item_id} cannot be negative ({quantity})")]
    NegativeReceipt { item_id: String, quantity: i64 },

    #[error("Purchase order {order_id} cannot be marked fully received: {outstanding} item(s) outstanding")]
    IncompleteReceipt { order_id: String, outstanding: usize },

    #[error("Receiving cannot set status {0}")]
    InvalidTargetStatus(PurchaseOrderStatus),

    #[error("Product {product_id} was not part of sale {sale_id}")]
    ProductNotInSale { sale_id: String, product_id: String },

    #[error("Cannot return {requested} of product {product_id} on sale {sale_id}: sold {sold}, already returned {already_returned}")]
    ReturnExceedsSold {
        sale_id: String,
        product_id: String,
        sold: i64,
        already_returned: i64,
        requested: i64,
    },

    #[error("Refund {requested} on sale {sale_id} exceeds the remaining {remaining}")]
    RefundExceedsSale {
        sale_id: String,
        requested: Money,
        remaining: Money,
    },

    /// The signed delta disagrees with the direction of the movement kind,
    /// e.g. a positive SALE_EXIT.
    #[error("Quantity {delta} is not valid for a {movement_type} movement")]
    MovementDirectionMismatch {
        movement_type: MovementType,
        delta: i64,
    },

    #[error("Stock of product {product_id} cannot move by {delta} from {current}")]
    StockOverflow {
        product_id: String,
        current: i64,
        delta: i64,
    },

    #[error("Amount overflow computing {0}")]
    AmountOverflow(String),

    #[error("A non-empty user id is required for stock mutations")]
    MissingActor,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error for the transport layer.
    pub fn kind(&self) -> ErrorKind {
        use CoreError::*;

        match self {
            ProductNotFound(_)
            | CustomerNotFound(_)
            | SaleNotFound(_)
            | ReturnNotFound(_)
            | PurchaseOrderNotFound(_)
            | PurchaseOrderItemNotFound { .. } => ErrorKind::NotFound,

            InsufficientStock { .. }
            | ProductInactive { .. }
            | InvalidSaleStatus { .. }
            | PurchaseOrderClosed { .. } => ErrorKind::Conflict,

            OverReceipt { .. }
            | NegativeReceipt { .. }
            | IncompleteReceipt { .. }
            | InvalidTargetStatus(_)
            | ProductNotInSale { .. }
            | ReturnExceedsSold { .. }
            | RefundExceedsSale { .. }
            | MovementDirectionMismatch { .. }
            | StockOverflow { .. }
            | AmountOverflow(_)
            | MissingActor
            | Validation(_) => ErrorKind::BadRequest,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any row is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} cannot be negative")]
    Negative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message_carries_context() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            name: "Widget".to_string(),
            required: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Widget (p-1): required 5, available 3"
        );
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_over_receipt_message_carries_context() {
        let err = CoreError::OverReceipt {
            item_id: "i-1".to_string(),
            product_id: "p-1".to_string(),
            ordered: 10,
            already_received: 4,
            receiving: 7,
        };
        assert_eq!(
            err.to_string(),
            "Cannot receive 7 of item i-1: ordered 10, already received 4"
        );
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            CoreError::ProductNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::PurchaseOrderClosed {
                order_id: "po".into(),
                status: PurchaseOrderStatus::Cancelled,
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(CoreError::MissingActor.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "reason".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_status_display_in_messages() {
        let err = CoreError::InvalidSaleStatus {
            sale_id: "s-1".into(),
            status: SaleStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Sale s-1 is CANCELLED, cannot perform operation");
    }
}

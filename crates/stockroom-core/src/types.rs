//! # Domain Types
//!
//! Entities persisted by stockroom-db and returned by its services.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐        ┌─────────────────────────────────┐        │
//! │  │    Product      │◄───────│        MovementRecord           │        │
//! │  │  ─────────────  │  1..n  │  ─────────────────────────────  │        │
//! │  │  current_stock  │        │  quantity (signed)              │        │
//! │  │  minimum_stock  │        │  movement_type ─► MovementType  │        │
//! │  └─────────────────┘        │  sale_id / purchase_order_id /  │        │
//! │         ▲                   │  return_id (correlation)        │        │
//! │         │                   └─────────────────────────────────┘        │
//! │  ┌──────┴──────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   SaleItem      │   │PurchaseOrderItem│   │   ReturnItem    │       │
//! │  │   Sale          │   │PurchaseOrder    │   │   SaleReturn    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (sku, receipt_number) - human-readable

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{BasisPoints, Money};

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
///
/// `current_stock` is written only by the stock mutator in stockroom-db.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    /// Stock Keeping Unit - business identifier.
    pub sku: String,
    pub name: String,
    pub selling_price_cents: i64,
    pub cost_price_cents: i64,
    pub current_stock: i64,
    /// Low-stock threshold. Reaching it from above raises an alert.
    pub minimum_stock: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// At or below the minimum stock threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer a sale may be attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Movement Type
// =============================================================================

/// Which way a movement kind moves stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockDirection {
    Inbound,
    Outbound,
}

/// The closed set of reasons stock can change.
///
/// Whether a kind may drive stock below zero is static data on the tag
/// (see [`MovementType::enforces_floor`]), not a decision made at each
/// call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    SaleExit,
    PurchaseEntry,
    AdjustmentIn,
    AdjustmentOut,
    CustomerReturn,
}

/// Static properties of a movement kind.
#[derive(Debug, Clone, Copy)]
struct MovementRule {
    code: &'static str,
    direction: StockDirection,
    enforces_floor: bool,
}

/// Indexed by `MovementType as usize`; order must follow the enum.
const MOVEMENT_RULES: [MovementRule; 5] = [
    MovementRule {
        code: "SALE_EXIT",
        direction: StockDirection::Outbound,
        enforces_floor: true,
    },
    MovementRule {
        code: "PURCHASE_ENTRY",
        direction: StockDirection::Inbound,
        enforces_floor: false,
    },
    MovementRule {
        code: "ADJUSTMENT_IN",
        direction: StockDirection::Inbound,
        enforces_floor: false,
    },
    MovementRule {
        code: "ADJUSTMENT_OUT",
        direction: StockDirection::Outbound,
        enforces_floor: true,
    },
    MovementRule {
        code: "CUSTOMER_RETURN",
        direction: StockDirection::Inbound,
        enforces_floor: false,
    },
];

impl MovementType {
    pub const ALL: [MovementType; 5] = [
        MovementType::SaleExit,
        MovementType::PurchaseEntry,
        MovementType::AdjustmentIn,
        MovementType::AdjustmentOut,
        MovementType::CustomerReturn,
    ];

    #[inline]
    fn rule(self) -> &'static MovementRule {
        &MOVEMENT_RULES[self as usize]
    }

    /// Storage and wire code, e.g. `SALE_EXIT`.
    pub fn as_str(self) -> &'static str {
        self.rule().code
    }

    pub fn direction(self) -> StockDirection {
        self.rule().direction
    }

    /// True when the movement must not leave stock below zero.
    pub fn enforces_floor(self) -> bool {
        self.rule().enforces_floor
    }

    /// Whether a signed delta points the way this kind moves stock.
    pub fn accepts_delta(self, delta: i64) -> bool {
        match self.direction() {
            StockDirection::Inbound => delta > 0,
            StockDirection::Outbound => delta < 0,
        }
    }

    /// Parses a storage/wire code.
    pub fn parse(code: &str) -> Option<MovementType> {
        MovementType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Movement Record
// =============================================================================

/// Optional links from a movement to the operation that caused it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Correlation {
    pub sale_id: Option<String>,
    pub purchase_order_id: Option<String>,
    pub return_id: Option<String>,
}

impl Correlation {
    pub fn none() -> Self {
        Correlation::default()
    }

    pub fn sale(sale_id: impl Into<String>) -> Self {
        Correlation {
            sale_id: Some(sale_id.into()),
            ..Correlation::default()
        }
    }

    pub fn purchase_order(order_id: impl Into<String>) -> Self {
        Correlation {
            purchase_order_id: Some(order_id.into()),
            ..Correlation::default()
        }
    }

    /// A return also points at the sale it reverses.
    pub fn sale_return(return_id: impl Into<String>, sale_id: impl Into<String>) -> Self {
        Correlation {
            sale_id: Some(sale_id.into()),
            return_id: Some(return_id.into()),
            ..Correlation::default()
        }
    }
}

/// One immutable entry of the movement ledger.
///
/// For every product, the sum of `quantity` over its records equals
/// `Product::current_stock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementRecord {
    pub id: String,
    pub product_id: String,
    /// Signed: negative for exits.
    pub quantity: i64,
    pub movement_type: MovementType,
    pub user_id: String,
    pub reason: Option<String>,
    pub sale_id: Option<String>,
    pub purchase_order_id: Option<String>,
    pub return_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl MovementRecord {
    pub fn correlation(&self) -> Correlation {
        Correlation {
            sale_id: self.sale_id.clone(),
            purchase_order_id: self.purchase_order_id.clone(),
            return_id: self.return_id.clone(),
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// Paid and finalized; stock has left.
    Completed,
    /// Reversed; unreturned stock was restored.
    Cancelled,
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SaleStatus::Completed => "COMPLETED",
            SaleStatus::Cancelled => "CANCELLED",
        })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    /// Card payment on an external terminal.
    Card,
    BankTransfer,
    Other,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale header. Created atomically with its items and movements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub receipt_number: String,
    pub user_id: String,
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub subtotal_cents: i64,
    /// Percentage discount requested, in basis points.
    pub discount_percent_bps: u32,
    /// Fixed discount requested, in cents.
    pub discount_amount_cents: i64,
    /// Discount actually applied (`subtotal - taxable`).
    pub discount_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> BasisPoints {
        BasisPoints::from_bps(self.tax_rate_bps)
    }
}

/// A sale line. Product data is frozen at the time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `unit_price × quantity`.
    pub item_subtotal_cents: i64,
    /// Equal to the subtotal; discounts apply at sale level.
    pub item_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn item_subtotal(&self) -> Money {
        Money::from_cents(self.item_subtotal_cents)
    }
}

/// A sale with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

impl SaleDetail {
    /// Total quantity of `product_id` across the sale's lines.
    pub fn quantity_sold(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .sum()
    }
}

// =============================================================================
// Purchase Order
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Pending,
    PartiallyReceived,
    FullyReceived,
    Cancelled,
}

impl PurchaseOrderStatus {
    /// No further receiving or cancellation is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::FullyReceived | PurchaseOrderStatus::Cancelled
        )
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PurchaseOrderStatus::Pending => "PENDING",
            PurchaseOrderStatus::PartiallyReceived => "PARTIALLY_RECEIVED",
            PurchaseOrderStatus::FullyReceived => "FULLY_RECEIVED",
            PurchaseOrderStatus::Cancelled => "CANCELLED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    pub supplier_id: String,
    pub status: PurchaseOrderStatus,
    pub total_cents: i64,
    pub created_by_user_id: String,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Set when the order becomes FULLY_RECEIVED.
    #[ts(as = "Option<String>")]
    pub received_at: Option<DateTime<Utc>>,
}

impl PurchaseOrder {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One ordered product. `quantity_received` only grows and never passes
/// `quantity_ordered`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseOrderItem {
    pub id: String,
    pub purchase_order_id: String,
    pub product_id: String,
    pub quantity_ordered: i64,
    pub quantity_received: i64,
    pub unit_cost_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PurchaseOrderItem {
    #[inline]
    pub fn outstanding(&self) -> i64 {
        self.quantity_ordered - self.quantity_received
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.quantity_received >= self.quantity_ordered
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrderDetail {
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

// =============================================================================
// Returns
// =============================================================================

/// A customer return against a completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleReturn {
    pub id: String,
    pub original_sale_id: String,
    pub processed_by_user_id: String,
    pub reason: String,
    pub refunded_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleReturn {
    #[inline]
    pub fn refunded(&self) -> Money {
        Money::from_cents(self.refunded_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReturnItem {
    pub id: String,
    pub return_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnDetail {
    #[serde(rename = "return")]
    pub sale_return: SaleReturn,
    pub items: Vec<ReturnItem>,
}

// =============================================================================
// Reconciliation
// =============================================================================

/// A product whose stored stock disagrees with its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerDiscrepancy {
    pub product_id: String,
    pub name: String,
    pub current_stock: i64,
    pub ledger_stock: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_rules_follow_enum_order() {
        for kind in MovementType::ALL {
            assert_eq!(MovementType::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_only_exits_enforce_floor() {
        assert!(MovementType::SaleExit.enforces_floor());
        assert!(MovementType::AdjustmentOut.enforces_floor());
        assert!(!MovementType::PurchaseEntry.enforces_floor());
        assert!(!MovementType::AdjustmentIn.enforces_floor());
        assert!(!MovementType::CustomerReturn.enforces_floor());
    }

    #[test]
    fn test_accepts_delta() {
        assert!(MovementType::SaleExit.accepts_delta(-1));
        assert!(!MovementType::SaleExit.accepts_delta(1));
        assert!(MovementType::CustomerReturn.accepts_delta(3));
        assert!(!MovementType::PurchaseEntry.accepts_delta(0));
    }

    #[test]
    fn test_movement_type_serde_matches_code() {
        let json = serde_json::to_string(&MovementType::CustomerReturn).unwrap();
        assert_eq!(json, "\"CUSTOMER_RETURN\"");
        assert_eq!(MovementType::parse("adjustment_out"), Some(MovementType::AdjustmentOut));
        assert_eq!(MovementType::parse("NOPE"), None);
    }

    #[test]
    fn test_purchase_order_status_terminal() {
        assert!(!PurchaseOrderStatus::Pending.is_terminal());
        assert!(!PurchaseOrderStatus::PartiallyReceived.is_terminal());
        assert!(PurchaseOrderStatus::FullyReceived.is_terminal());
        assert!(PurchaseOrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_correlation_for_return_links_sale() {
        let correlation = Correlation::sale_return("r-1", "s-1");
        assert_eq!(correlation.return_id.as_deref(), Some("r-1"));
        assert_eq!(correlation.sale_id.as_deref(), Some("s-1"));
        assert!(correlation.purchase_order_id.is_none());
    }
}

//! # Commands
//!
//! Inputs accepted by the stockroom-db services. These are what a transport
//! layer deserializes a request into; none of them is persisted as-is.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{MovementType, PaymentMethod, PurchaseOrderStatus};

// =============================================================================
// Actor
// =============================================================================

/// The user performing a mutation.
///
/// Construction rejects blank ids, so every movement written downstream
/// carries an attributable user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Actor {
    user_id: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>) -> CoreResult<Self> {
        let user_id = user_id.into().trim().to_string();
        if user_id.is_empty() {
            return Err(CoreError::MissingActor);
        }
        Ok(Actor { user_id })
    }

    #[inline]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub selling_price_cents: i64,
    pub cost_price_cents: i64,
    #[serde(default)]
    pub minimum_stock: i64,
    /// Recorded as an ADJUSTMENT_IN movement when positive.
    #[serde(default)]
    pub opening_stock: i64,
}

/// Partial product update. Stock is not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub selling_price_cents: Option<i64>,
    pub cost_price_cents: Option<i64>,
    pub minimum_stock: Option<i64>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Order-level discount: percentage first, then a fixed amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountInput {
    #[serde(default)]
    pub percent_bps: u32,
    #[serde(default)]
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateSale {
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<SaleLine>,
    pub discount: Option<DiscountInput>,
    pub notes: Option<String>,
}

// =============================================================================
// Purchase Orders
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPurchaseOrderItem {
    pub product_id: String,
    pub quantity_ordered: i64,
    pub unit_cost_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreatePurchaseOrder {
    pub supplier_id: String,
    pub items: Vec<NewPurchaseOrderItem>,
    pub notes: Option<String>,
}

/// How a receipt line names the order item it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemRef {
    /// `PurchaseOrderItem::id`.
    Item(String),
    /// The first item of the order carrying this product.
    Product(String),
}

impl ItemRef {
    pub fn describe(&self) -> String {
        match self {
            ItemRef::Item(id) => format!("item {id}"),
            ItemRef::Product(id) => format!("product {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub item: ItemRef,
    pub quantity_received_now: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceivePurchaseOrder {
    pub lines: Vec<ReceiptLine>,
    /// Only FULLY_RECEIVED or PARTIALLY_RECEIVED are meaningful here.
    pub target_status: Option<PurchaseOrderStatus>,
}

// =============================================================================
// Returns
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnLine {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateReturn {
    pub original_sale_id: String,
    pub reason: String,
    pub refunded_cents: i64,
    pub items: Vec<ReturnLine>,
}

impl CreateReturn {
    #[inline]
    pub fn refunded(&self) -> Money {
        Money::from_cents(self.refunded_cents)
    }
}

// =============================================================================
// Manual Adjustments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    In,
    Out,
}

impl AdjustmentDirection {
    pub fn movement_type(self) -> MovementType {
        match self {
            AdjustmentDirection::In => MovementType::AdjustmentIn,
            AdjustmentDirection::Out => MovementType::AdjustmentOut,
        }
    }

    /// Signed delta for a positive quantity.
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            AdjustmentDirection::In => quantity,
            AdjustmentDirection::Out => -quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ManualAdjustment {
    pub product_id: String,
    pub direction: AdjustmentDirection,
    pub quantity: i64,
    pub reason: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_rejects_blank_user() {
        assert!(matches!(Actor::new(""), Err(CoreError::MissingActor)));
        assert!(matches!(Actor::new("   "), Err(CoreError::MissingActor)));
        assert_eq!(Actor::new(" u-1 ").unwrap().user_id(), "u-1");
    }

    #[test]
    fn test_adjustment_direction_signs() {
        assert_eq!(AdjustmentDirection::In.signed(4), 4);
        assert_eq!(AdjustmentDirection::Out.signed(4), -4);
        assert_eq!(
            AdjustmentDirection::Out.movement_type(),
            MovementType::AdjustmentOut
        );
    }

    #[test]
    fn test_item_ref_deserializes_tagged() {
        let line: ReceiptLine = serde_json::from_str(
            r#"{"item":{"product":"p-1"},"quantity_received_now":5}"#,
        )
        .unwrap();
        assert_eq!(line.item, ItemRef::Product("p-1".to_string()));
    }

    #[test]
    fn test_discount_defaults() {
        let discount: DiscountInput = serde_json::from_str(r#"{"percent_bps":500}"#).unwrap();
        assert_eq!(discount.amount_cents, 0);
        assert_eq!(discount.percent_bps, 500);
    }

    #[test]
    fn test_refunded_money() {
        let request = CreateReturn {
            original_sale_id: "s".into(),
            reason: "damaged".into(),
            refunded_cents: 1250,
            items: vec![],
        };
        assert_eq!(request.refunded(), Money::from_cents(1250));
    }
}

//! # Validation Module
//!
//! Input validation for commands, run before any row is read or written.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (not in this workspace)                            │
//! │  └── Deserialization into commands                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - shape of the request                           │
//! │  ├── quantities positive, prices non-negative                          │
//! │  └── reasons present and bounded                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Domain rules (stock, receiving, returns modules)             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── CHECK (current_stock >= 0)                                        │
//! │  ├── UNIQUE / FOREIGN KEY constraints                                  │
//! │  └── Append-only triggers on stock_movements                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("WIDGET-01").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::commands::{
    CreatePurchaseOrder, CreateReturn, CreateSale, DiscountInput, ManualAdjustment, NewProduct,
    ProductUpdate,
};
use crate::error::ValidationError;
use crate::{
    MAX_LINE_QUANTITY, MAX_MOVEMENT_QUANTITY, MAX_PRICE_CENTS, MAX_REASON_LENGTH, MAX_SALE_LINES,
};

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_sku;
///
/// assert!(validate_sku("WIDGET-01").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a mandatory free-form reason (adjustments, returns).
///
/// Returns the trimmed reason.
pub fn validate_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.chars().count() > MAX_REASON_LENGTH {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LENGTH,
        });
    }

    Ok(reason.to_string())
}

fn validate_required_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale or return line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a purchase-order, adjustment or opening-stock quantity.
///
/// Zero is left to the caller; opening stock accepts it.
pub fn validate_movement_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if qty > MAX_MOVEMENT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost in cents. Zero is allowed.
///
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a rate in basis points (0% to 100%).
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

pub fn validate_discount(discount: &DiscountInput) -> ValidationResult<()> {
    validate_rate_bps("discount percentage", discount.percent_bps)?;

    if discount.amount_cents < 0 {
        return Err(ValidationError::Negative {
            field: "discount amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Command Validators
// =============================================================================

pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_sku(&product.sku)?;
    validate_product_name(&product.name)?;
    validate_price_cents(product.selling_price_cents)?;
    validate_price_cents(product.cost_price_cents)?;

    if product.minimum_stock < 0 {
        return Err(ValidationError::Negative {
            field: "minimum_stock".to_string(),
        });
    }

    validate_movement_quantity("opening_stock", product.opening_stock)?;

    Ok(())
}

pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(price) = update.selling_price_cents {
        validate_price_cents(price)?;
    }
    if let Some(cost) = update.cost_price_cents {
        validate_price_cents(cost)?;
    }
    if matches!(update.minimum_stock, Some(min) if min < 0) {
        return Err(ValidationError::Negative {
            field: "minimum_stock".to_string(),
        });
    }

    Ok(())
}

/// Shape checks for a sale. Stock and product state are checked later,
/// inside the transaction.
pub fn validate_create_sale(request: &CreateSale) -> ValidationResult<()> {
    if request.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if request.lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    for line in &request.lines {
        validate_required_id("product_id", &line.product_id)?;
        validate_quantity(line.quantity)?;
    }

    if let Some(discount) = &request.discount {
        validate_discount(discount)?;
    }

    Ok(())
}

pub fn validate_create_purchase_order(request: &CreatePurchaseOrder) -> ValidationResult<()> {
    validate_required_id("supplier_id", &request.supplier_id)?;

    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    for item in &request.items {
        validate_required_id("product_id", &item.product_id)?;
        if item.quantity_ordered <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity_ordered".to_string(),
            });
        }
        validate_movement_quantity("quantity_ordered", item.quantity_ordered)?;
        validate_price_cents(item.unit_cost_cents)?;
    }

    Ok(())
}

pub fn validate_create_return(request: &CreateReturn) -> ValidationResult<()> {
    validate_required_id("original_sale_id", &request.original_sale_id)?;
    validate_reason(&request.reason)?;

    if request.refunded_cents < 0 {
        return Err(ValidationError::Negative {
            field: "refunded amount".to_string(),
        });
    }

    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    for item in &request.items {
        validate_required_id("product_id", &item.product_id)?;
        validate_quantity(item.quantity)?;
    }

    Ok(())
}

pub fn validate_manual_adjustment(request: &ManualAdjustment) -> ValidationResult<()> {
    validate_required_id("product_id", &request.product_id)?;

    if request.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    validate_movement_quantity("quantity", request.quantity)?;

    validate_reason(&request.reason)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AdjustmentDirection, NewPurchaseOrderItem, ReturnLine, SaleLine};
    use crate::types::PaymentMethod;

    fn sale_with(lines: Vec<SaleLine>) -> CreateSale {
        CreateSale {
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            lines,
            discount: None,
            notes: None,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("WIDGET-01").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_reason() {
        assert_eq!(validate_reason("  damaged box ").unwrap(), "damaged box");
        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
        assert!(validate_reason(&"x".repeat(MAX_REASON_LENGTH)).is_ok());
        assert!(validate_reason(&"x".repeat(MAX_REASON_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&DiscountInput { percent_bps: 10_000, amount_cents: 0 }).is_ok());
        assert!(validate_discount(&DiscountInput { percent_bps: 10_001, amount_cents: 0 }).is_err());
        assert!(validate_discount(&DiscountInput { percent_bps: 0, amount_cents: -1 }).is_err());
    }

    #[test]
    fn test_validate_create_sale() {
        assert!(validate_create_sale(&sale_with(vec![])).is_err());
        assert!(validate_create_sale(&sale_with(vec![SaleLine {
            product_id: "p".into(),
            quantity: 0,
        }]))
        .is_err());
        assert!(validate_create_sale(&sale_with(vec![SaleLine {
            product_id: "p".into(),
            quantity: 2,
        }]))
        .is_ok());
    }

    #[test]
    fn test_validate_create_purchase_order() {
        let mut request = CreatePurchaseOrder {
            supplier_id: "sup-1".into(),
            items: vec![NewPurchaseOrderItem {
                product_id: "p".into(),
                quantity_ordered: 10,
                unit_cost_cents: 250,
            }],
            notes: None,
        };
        assert!(validate_create_purchase_order(&request).is_ok());

        request.items[0].quantity_ordered = 0;
        assert!(validate_create_purchase_order(&request).is_err());

        request.items[0].quantity_ordered = 1;
        request.items[0].unit_cost_cents = -1;
        assert!(validate_create_purchase_order(&request).is_err());

        request.items[0].unit_cost_cents = MAX_PRICE_CENTS + 1;
        assert!(validate_create_purchase_order(&request).is_err());

        request.items[0].unit_cost_cents = 250;
        request.items[0].quantity_ordered = MAX_MOVEMENT_QUANTITY + 1;
        assert!(matches!(
            validate_create_purchase_order(&request),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_new_product_bounds() {
        let mut product = NewProduct {
            sku: "BOLT-M6".into(),
            name: "M6 bolt".into(),
            selling_price_cents: 25,
            cost_price_cents: 10,
            minimum_stock: 100,
            opening_stock: MAX_MOVEMENT_QUANTITY,
        };
        assert!(validate_new_product(&product).is_ok());

        product.opening_stock = i64::MAX;
        assert!(matches!(
            validate_new_product(&product),
            Err(ValidationError::OutOfRange { .. })
        ));

        product.opening_stock = 0;
        product.selling_price_cents = i64::MAX / 2;
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn test_validate_create_return_rejects_negative_refund() {
        let request = CreateReturn {
            original_sale_id: "s".into(),
            reason: "wrong size".into(),
            refunded_cents: -5,
            items: vec![ReturnLine {
                product_id: "p".into(),
                quantity: 1,
            }],
        };
        assert!(matches!(
            validate_create_return(&request),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_validate_manual_adjustment() {
        let mut request = ManualAdjustment {
            product_id: "p".into(),
            direction: AdjustmentDirection::Out,
            quantity: 3,
            reason: "breakage".into(),
        };
        assert!(validate_manual_adjustment(&request).is_ok());

        request.quantity = 0;
        assert!(validate_manual_adjustment(&request).is_err());

        request.quantity = i64::MAX;
        assert!(matches!(
            validate_manual_adjustment(&request),
            Err(ValidationError::OutOfRange { .. })
        ));

        request.quantity = 3;
        request.reason = " ".into();
        assert!(validate_manual_adjustment(&request).is_err());
    }
}

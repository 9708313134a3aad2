//! # Sale Pricing
//!
//! Turns priced lines and an order-level discount into sale totals.
//!
//! ```text
//!   subtotal      = Σ unit_price × quantity
//!   after_percent = subtotal − round(subtotal × percent_bps)
//!   taxable       = max(after_percent − fixed_amount, 0)
//!   tax           = round(taxable × tax_rate_bps)
//!   total         = taxable + tax
//!   discount      = subtotal − taxable
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::commands::DiscountInput;
use crate::error::{CoreError, CoreResult};
use crate::money::{BasisPoints, Money};
use crate::types::Product;
use crate::validation::{validate_discount, validate_rate_bps};

/// Order-level discount after validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleDiscount {
    pub percent: BasisPoints,
    pub amount: Money,
}

impl SaleDiscount {
    pub fn new(percent: BasisPoints, amount: Money) -> Self {
        SaleDiscount { percent, amount }
    }

    pub fn none() -> Self {
        SaleDiscount::default()
    }

    pub fn from_input(input: Option<&DiscountInput>) -> CoreResult<Self> {
        match input {
            None => Ok(SaleDiscount::none()),
            Some(input) => {
                validate_discount(input)?;
                Ok(SaleDiscount::new(
                    BasisPoints::from_bps(input.percent_bps),
                    Money::from_cents(input.amount_cents),
                ))
            }
        }
    }
}

/// One sale line with its price frozen from the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub item_subtotal: Money,
}

impl PricedLine {
    pub fn from_product(product: &Product, quantity: i64) -> CoreResult<Self> {
        let unit_price = product.selling_price();
        let item_subtotal = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| CoreError::AmountOverflow(format!("line total for {}", product.sku)))?;

        Ok(PricedLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            quantity,
            unit_price,
            item_subtotal,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

pub fn compute_totals(
    subtotal: Money,
    discount: &SaleDiscount,
    tax_rate: BasisPoints,
) -> CoreResult<SaleTotals> {
    validate_rate_bps("tax rate", tax_rate.bps())?;

    let after_percent = subtotal - subtotal.portion(discount.percent);
    let taxable = (after_percent - discount.amount).clamp_non_negative();
    let tax = taxable.portion(tax_rate);

    Ok(SaleTotals {
        subtotal,
        discount: subtotal - taxable,
        tax,
        total: taxable + tax,
    })
}

pub fn price_lines(
    lines: &[PricedLine],
    discount: &SaleDiscount,
    tax_rate: BasisPoints,
) -> CoreResult<SaleTotals> {
    let subtotal = Money::checked_sum(lines.iter().map(|line| line.item_subtotal))
        .ok_or_else(|| CoreError::AmountOverflow("sale subtotal".to_string()))?;
    compute_totals(subtotal, discount, tax_rate)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_discount_no_tax() {
        let totals = compute_totals(Money::from_cents(3_000), &SaleDiscount::none(), BasisPoints::zero()).unwrap();
        assert_eq!(totals.subtotal.cents(), 3_000);
        assert_eq!(totals.discount, Money::zero());
        assert_eq!(totals.tax, Money::zero());
        assert_eq!(totals.total.cents(), 3_000);
    }

    #[test]
    fn test_percentage_then_fixed() {
        // 10% off 100.00 = 90.00, then 5.00 off = 85.00
        let discount = SaleDiscount::new(BasisPoints::from_bps(1_000), Money::from_cents(500));
        let totals = compute_totals(Money::from_cents(10_000), &discount, BasisPoints::zero()).unwrap();
        assert_eq!(totals.total.cents(), 8_500);
        assert_eq!(totals.discount.cents(), 1_500);
    }

    #[test]
    fn test_discount_clamps_at_zero() {
        let discount = SaleDiscount::new(BasisPoints::zero(), Money::from_cents(5_000));
        let totals = compute_totals(Money::from_cents(1_000), &discount, BasisPoints::from_bps(825)).unwrap();
        assert_eq!(totals.total, Money::zero());
        assert_eq!(totals.tax, Money::zero());
        assert_eq!(totals.discount.cents(), 1_000);
    }

    #[test]
    fn test_tax_on_discounted_amount() {
        // 20.00 - 10% = 18.00; 8.25% tax = 1.485 → 1.49
        let discount = SaleDiscount::new(BasisPoints::from_bps(1_000), Money::zero());
        let totals = compute_totals(Money::from_cents(2_000), &discount, BasisPoints::from_bps(825)).unwrap();
        assert_eq!(totals.tax.cents(), 149);
        assert_eq!(totals.total.cents(), 1_949);
    }

    #[test]
    fn test_invalid_tax_rate_rejected() {
        assert!(compute_totals(Money::from_cents(100), &SaleDiscount::none(), BasisPoints::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_from_input_validates() {
        let bad = DiscountInput { percent_bps: 20_000, amount_cents: 0 };
        assert!(SaleDiscount::from_input(Some(&bad)).is_err());
        assert_eq!(SaleDiscount::from_input(None).unwrap(), SaleDiscount::none());
    }

    #[test]
    fn test_price_lines_sums_subtotals() {
        let lines = vec![
            PricedLine {
                product_id: "a".into(),
                sku: "A".into(),
                name: "A".into(),
                quantity: 3,
                unit_price: Money::from_cents(1_000),
                item_subtotal: Money::from_cents(3_000),
            },
            PricedLine {
                product_id: "b".into(),
                sku: "B".into(),
                name: "B".into(),
                quantity: 1,
                unit_price: Money::from_cents(250),
                item_subtotal: Money::from_cents(250),
            },
        ];
        let totals = price_lines(&lines, &SaleDiscount::none(), BasisPoints::zero()).unwrap();
        assert_eq!(totals.subtotal.cents(), 3_250);
    }

    #[test]
    fn test_line_total_overflow_is_rejected() {
        let now = chrono::Utc::now();
        let product = Product {
            id: "p-1".into(),
            sku: "GOLD-BAR".into(),
            name: "Gold bar".into(),
            selling_price_cents: i64::MAX / 2,
            cost_price_cents: 0,
            current_stock: 10,
            minimum_stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert!(PricedLine::from_product(&product, 2).is_ok());
        let err = PricedLine::from_product(&product, 3).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::BadRequest);

        let line = PricedLine::from_product(&product, 2).unwrap();
        assert!(matches!(
            price_lines(&[line.clone(), line], &SaleDiscount::none(), BasisPoints::zero()),
            Err(CoreError::AmountOverflow(_))
        ));
    }
}

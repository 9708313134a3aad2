//! # Return Rules
//!
//! Bounds on what may come back from a sale, and what a cancellation puts
//! back on the shelf.
//!
//! ```text
//!   returnable(product) = Σ sold on the sale − Σ returned on earlier returns
//!   requested(product)  = Σ over this payload (duplicates are summed)
//!   requested ≤ returnable, per product
//! ```

use std::collections::HashMap;

use crate::commands::ReturnLine;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Sale, SaleDetail, SaleStatus};

/// Quantities returned so far on one sale, keyed by product id.
pub type ReturnedQuantities = HashMap<String, i64>;

/// Only completed sales accept returns or cancellation.
pub fn ensure_completed(sale: &Sale) -> CoreResult<()> {
    if sale.status != SaleStatus::Completed {
        return Err(CoreError::InvalidSaleStatus {
            sale_id: sale.id.clone(),
            status: sale.status,
        });
    }
    Ok(())
}

/// Merges duplicate products, keeping first-seen order.
pub fn merge_lines(lines: &[ReturnLine]) -> Vec<ReturnLine> {
    let mut merged: Vec<ReturnLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line.clone()),
        }
    }
    merged
}

/// Checks every merged line against what is still returnable.
///
/// Returns the merged lines on success.
pub fn check_quantities(
    sale: &SaleDetail,
    returned: &ReturnedQuantities,
    lines: &[ReturnLine],
) -> CoreResult<Vec<ReturnLine>> {
    let merged = merge_lines(lines);

    for line in &merged {
        let sold = sale.quantity_sold(&line.product_id);
        if sold == 0 {
            return Err(CoreError::ProductNotInSale {
                sale_id: sale.sale.id.clone(),
                product_id: line.product_id.clone(),
            });
        }

        let already_returned = returned.get(&line.product_id).copied().unwrap_or(0);
        if already_returned + line.quantity > sold {
            return Err(CoreError::ReturnExceedsSold {
                sale_id: sale.sale.id.clone(),
                product_id: line.product_id.clone(),
                sold,
                already_returned,
                requested: line.quantity,
            });
        }
    }

    Ok(merged)
}

/// Cumulative refunds may not exceed what the customer paid.
pub fn check_refund(sale: &Sale, already_refunded: Money, requested: Money) -> CoreResult<()> {
    let remaining = (sale.total() - already_refunded).clamp_non_negative();
    if requested > remaining {
        return Err(CoreError::RefundExceedsSale {
            sale_id: sale.id.clone(),
            requested,
            remaining,
        });
    }
    Ok(())
}

/// Per product, the quantity a cancellation restores: sold minus returned.
pub fn restorable(sale: &SaleDetail, returned: &ReturnedQuantities) -> Vec<(String, i64)> {
    let mut out: Vec<(String, i64)> = Vec::new();
    for item in &sale.items {
        if out.iter().any(|(product_id, _)| product_id == &item.product_id) {
            continue;
        }
        let sold = sale.quantity_sold(&item.product_id);
        let back = returned.get(&item.product_id).copied().unwrap_or(0);
        let remaining = sold - back;
        if remaining > 0 {
            out.push((item.product_id.clone(), remaining));
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, SaleItem};
    use chrono::Utc;

    fn sale_detail(status: SaleStatus, lines: &[(&str, i64)]) -> SaleDetail {
        let now = Utc::now();
        SaleDetail {
            sale: Sale {
                id: "s-1".into(),
                receipt_number: "R-1".into(),
                user_id: "u-1".into(),
                customer_id: None,
                payment_method: PaymentMethod::Cash,
                status,
                subtotal_cents: 5_000,
                discount_percent_bps: 0,
                discount_amount_cents: 0,
                discount_cents: 0,
                tax_rate_bps: 0,
                tax_cents: 0,
                total_cents: 5_000,
                notes: None,
                created_at: now,
                updated_at: now,
                cancelled_at: None,
            },
            items: lines
                .iter()
                .enumerate()
                .map(|(i, (product_id, qty))| SaleItem {
                    id: format!("si-{i}"),
                    sale_id: "s-1".into(),
                    product_id: product_id.to_string(),
                    sku_snapshot: product_id.to_uppercase(),
                    name_snapshot: product_id.to_string(),
                    quantity: *qty,
                    unit_price_cents: 1_000,
                    item_subtotal_cents: 1_000 * qty,
                    item_total_cents: 1_000 * qty,
                    created_at: now,
                })
                .collect(),
        }
    }

    fn ret(product_id: &str, quantity: i64) -> ReturnLine {
        ReturnLine {
            product_id: product_id.into(),
            quantity,
        }
    }

    #[test]
    fn test_return_within_sold() {
        let sale = sale_detail(SaleStatus::Completed, &[("p-a", 3)]);
        let merged = check_quantities(&sale, &ReturnedQuantities::new(), &[ret("p-a", 2)]).unwrap();
        assert_eq!(merged, vec![ret("p-a", 2)]);
    }

    #[test]
    fn test_cumulative_bound() {
        let sale = sale_detail(SaleStatus::Completed, &[("p-a", 3)]);
        let mut returned = ReturnedQuantities::new();
        returned.insert("p-a".into(), 2);

        let err = check_quantities(&sale, &returned, &[ret("p-a", 2)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ReturnExceedsSold { sold: 3, already_returned: 2, requested: 2, .. }
        ));
        assert!(check_quantities(&sale, &returned, &[ret("p-a", 1)]).is_ok());
    }

    #[test]
    fn test_duplicate_lines_are_summed() {
        let sale = sale_detail(SaleStatus::Completed, &[("p-a", 3)]);
        let err = check_quantities(
            &sale,
            &ReturnedQuantities::new(),
            &[ret("p-a", 2), ret("p-a", 2)],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ReturnExceedsSold { requested: 4, .. }));
    }

    #[test]
    fn test_product_not_in_sale() {
        let sale = sale_detail(SaleStatus::Completed, &[("p-a", 3)]);
        assert!(matches!(
            check_quantities(&sale, &ReturnedQuantities::new(), &[ret("p-b", 1)]),
            Err(CoreError::ProductNotInSale { .. })
        ));
    }

    #[test]
    fn test_cancelled_sale_rejects() {
        let sale = sale_detail(SaleStatus::Cancelled, &[("p-a", 3)]);
        assert!(matches!(
            ensure_completed(&sale.sale),
            Err(CoreError::InvalidSaleStatus { .. })
        ));
    }

    #[test]
    fn test_refund_bound() {
        let sale = sale_detail(SaleStatus::Completed, &[("p-a", 5)]);
        assert!(check_refund(&sale.sale, Money::zero(), Money::from_cents(5_000)).is_ok());
        assert!(check_refund(&sale.sale, Money::from_cents(4_000), Money::from_cents(1_001)).is_err());
    }

    #[test]
    fn test_restorable_subtracts_returns_and_merges_lines() {
        let sale = sale_detail(SaleStatus::Completed, &[("p-a", 3), ("p-b", 1), ("p-a", 2)]);
        let mut returned = ReturnedQuantities::new();
        returned.insert("p-a".into(), 1);
        returned.insert("p-b".into(), 1);

        assert_eq!(restorable(&sale, &returned), vec![("p-a".to_string(), 4)]);
    }
}

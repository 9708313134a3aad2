//! # Purchase-Order Receiving Rules
//!
//! Validates a receipt payload against an order's items and derives the
//! order status afterwards. The database side only loads rows, calls these
//! functions, and writes what they return.
//!
//! ## Status Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   PENDING ──receive(some)──► PARTIALLY_RECEIVED ──receive(rest)──┐     │
//! │      │                              │                             │     │
//! │      │                              │                             ▼     │
//! │      └──────receive(all)────────────┴─────────────────► FULLY_RECEIVED  │
//! │      │                              │                                   │
//! │      └──────cancel──────────────────┴─────────────────► CANCELLED       │
//! │                                                                         │
//! │   FULLY_RECEIVED and CANCELLED accept nothing further.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::commands::{ItemRef, ReceiptLine};
use crate::error::{CoreError, CoreResult};
use crate::types::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus};

/// A positive quantity to book against one order item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedReceipt {
    pub item_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// The item's `quantity_received` once this receipt is booked.
    pub received_total: i64,
}

/// Rejects orders that can no longer change.
pub fn ensure_open(order: &PurchaseOrder) -> CoreResult<()> {
    if order.status.is_terminal() {
        return Err(CoreError::PurchaseOrderClosed {
            order_id: order.id.clone(),
            status: order.status,
        });
    }
    Ok(())
}

/// Receiving may only ask for a received state.
pub fn check_target(target: Option<PurchaseOrderStatus>) -> CoreResult<()> {
    match target {
        None
        | Some(PurchaseOrderStatus::PartiallyReceived)
        | Some(PurchaseOrderStatus::FullyReceived) => Ok(()),
        Some(other) => Err(CoreError::InvalidTargetStatus(other)),
    }
}

fn resolve<'a>(
    order_id: &str,
    items: &'a mut [PurchaseOrderItem],
    reference: &ItemRef,
) -> CoreResult<&'a mut PurchaseOrderItem> {
    let found = match reference {
        ItemRef::Item(id) => items.iter_mut().find(|item| &item.id == id),
        ItemRef::Product(product_id) => items
            .iter_mut()
            .find(|item| &item.product_id == product_id),
    };

    found.ok_or_else(|| CoreError::PurchaseOrderItemNotFound {
        order_id: order_id.to_string(),
        reference: reference.describe(),
    })
}

/// Applies `lines` to `items` in order, updating `quantity_received`.
///
/// Lines hitting the same item accumulate, so the over-receipt bound holds
/// across the whole payload. Zero-quantity lines are accepted and produce
/// no receipt.
pub fn apply_receipt(
    order_id: &str,
    items: &mut [PurchaseOrderItem],
    lines: &[ReceiptLine],
) -> CoreResult<Vec<AppliedReceipt>> {
    let mut applied = Vec::with_capacity(lines.len());

    for line in lines {
        let item = resolve(order_id, items, &line.item)?;
        let now = line.quantity_received_now;

        if now < 0 {
            return Err(CoreError::NegativeReceipt {
                item_id: item.id.clone(),
                quantity: now,
            });
        }

        if now > item.outstanding() {
            return Err(CoreError::OverReceipt {
                item_id: item.id.clone(),
                product_id: item.product_id.clone(),
                ordered: item.quantity_ordered,
                already_received: item.quantity_received,
                receiving: now,
            });
        }

        if now == 0 {
            continue;
        }

        item.quantity_received += now;
        applied.push(AppliedReceipt {
            item_id: item.id.clone(),
            product_id: item.product_id.clone(),
            quantity: now,
            received_total: item.quantity_received,
        });
    }

    Ok(applied)
}

/// Status after a receipt has been applied to `items`.
///
/// A requested FULLY_RECEIVED must be backed by the items; otherwise the
/// derived status wins.
pub fn derive_status(
    order: &PurchaseOrder,
    items: &[PurchaseOrderItem],
    received_now: bool,
    target: Option<PurchaseOrderStatus>,
) -> CoreResult<PurchaseOrderStatus> {
    check_target(target)?;

    let outstanding = items.iter().filter(|item| !item.is_complete()).count();

    let derived = if outstanding == 0 {
        PurchaseOrderStatus::FullyReceived
    } else if received_now {
        PurchaseOrderStatus::PartiallyReceived
    } else {
        order.status
    };

    if target == Some(PurchaseOrderStatus::FullyReceived)
        && derived != PurchaseOrderStatus::FullyReceived
    {
        return Err(CoreError::IncompleteReceipt {
            order_id: order.id.clone(),
            outstanding,
        });
    }

    Ok(derived)
}

// =============================================================================
// Unit Tests
// =============================================================================

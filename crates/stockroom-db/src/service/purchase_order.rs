//! # Purchase Order Service
//!
//! Creates orders, receives goods against them, cancels them.
//!
//! ## Receiving
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  target ∈ {none, PARTIALLY_RECEIVED, FULLY_RECEIVED}? ─► BadRequest     │
//! │  BEGIN                                                                  │
//! │  order exists? ───────────────────────────────────────► NotFound        │
//! │  order open? (not FULLY_RECEIVED / CANCELLED) ────────► Conflict        │
//! │  apply lines in memory: received + now ≤ ordered ─────► BadRequest      │
//! │  derive status (FULLY_RECEIVED target must be met) ───► BadRequest      │
//! │       │                                                                 │
//! │  per applied line:                                                      │
//! │     UPDATE item.quantity_received                                       │
//! │     StockMutator::adjust(+qty, PURCHASE_ENTRY, order_id)                │
//! │  UPDATE order.status                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is written until every line has been checked, so a rejected
//! receipt leaves the order, its items and stock untouched.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::DbResult;
use crate::notify::{dispatch, SharedObserver};
use crate::repository::{product, purchase_order};
use crate::service::finish;
use crate::stock::{StockAdjustment, StockMutator};
use stockroom_core::receiving::{apply_receipt, check_target, derive_status, ensure_open};
use stockroom_core::validation::validate_create_purchase_order;
use stockroom_core::{
    Actor, CoreError, Correlation, CreatePurchaseOrder, LowStockAlert, Money, MovementType,
    PurchaseOrder, PurchaseOrderDetail, PurchaseOrderItem, PurchaseOrderStatus,
    ReceivePurchaseOrder,
};

#[derive(Clone)]
pub struct PurchaseOrderService {
    pool: SqlitePool,
    observer: SharedObserver,
}

impl PurchaseOrderService {
    pub fn new(pool: SqlitePool, observer: SharedObserver) -> Self {
        PurchaseOrderService { pool, observer }
    }

    /// Opens a PENDING order. No stock moves until goods are received.
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreatePurchaseOrder,
    ) -> DbResult<PurchaseOrderDetail> {
        validate_create_purchase_order(&request)?;

        let mut tx = self.pool.begin().await?;
        let outcome = create_in(&mut tx, actor, &request).await;
        let detail = finish(tx, outcome, "purchase_order.create").await?;

        info!(
            order_id = %detail.order.id,
            supplier_id = %detail.order.supplier_id,
            items = detail.items.len(),
            "Purchase order created"
        );
        Ok(detail)
    }

    /// Books received goods and moves the order forward.
    pub async fn receive(
        &self,
        actor: &Actor,
        order_id: &str,
        request: ReceivePurchaseOrder,
    ) -> DbResult<PurchaseOrderDetail> {
        check_target(request.target_status)?;

        let mut tx = self.pool.begin().await?;
        let outcome = receive_in(&mut tx, actor, order_id, &request).await;
        let (detail, alerts) = finish(tx, outcome, "purchase_order.receive").await?;

        info!(
            order_id = %order_id,
            status = %detail.order.status,
            "Purchase order received"
        );
        dispatch(self.observer.as_ref(), &alerts);
        Ok(detail)
    }

    /// Cancels an open order. Stock already received stays.
    pub async fn cancel(&self, order_id: &str) -> DbResult<PurchaseOrderDetail> {
        let mut tx = self.pool.begin().await?;
        let outcome = cancel_in(&mut tx, order_id).await;
        let detail = finish(tx, outcome, "purchase_order.cancel").await?;

        info!(order_id = %order_id, "Purchase order cancelled");
        Ok(detail)
    }

    pub async fn get(&self, order_id: &str) -> DbResult<PurchaseOrderDetail> {
        let mut conn = self.pool.acquire().await?;
        purchase_order::fetch_detail(&mut conn, order_id)
            .await?
            .ok_or_else(|| CoreError::PurchaseOrderNotFound(order_id.to_string()).into())
    }
}

async fn create_in(
    conn: &mut SqliteConnection,
    actor: &Actor,
    request: &CreatePurchaseOrder,
) -> DbResult<PurchaseOrderDetail> {
    for item in &request.items {
        product::require(&mut *conn, &item.product_id).await?;
    }

    let now = Utc::now();
    let order_id = Uuid::new_v4().to_string();

    let items: Vec<PurchaseOrderItem> = request
        .items
        .iter()
        .map(|item| PurchaseOrderItem {
            id: Uuid::new_v4().to_string(),
            purchase_order_id: order_id.clone(),
            product_id: item.product_id.clone(),
            quantity_ordered: item.quantity_ordered,
            quantity_received: 0,
            unit_cost_cents: item.unit_cost_cents,
            created_at: now,
        })
        .collect();

    let line_totals = items
        .iter()
        .map(|item| Money::from_cents(item.unit_cost_cents).checked_multiply_quantity(item.quantity_ordered))
        .collect::<Option<Vec<Money>>>();
    let total = line_totals
        .and_then(Money::checked_sum)
        .ok_or_else(|| CoreError::AmountOverflow("purchase order total".to_string()))?;

    let order = PurchaseOrder {
        id: order_id,
        supplier_id: request.supplier_id.clone(),
        status: PurchaseOrderStatus::Pending,
        total_cents: total.cents(),
        created_by_user_id: actor.user_id().to_string(),
        notes: request.notes.clone(),
        created_at: now,
        updated_at: now,
        received_at: None,
    };

    purchase_order::insert_order(&mut *conn, &order).await?;
    for item in &items {
        purchase_order::insert_item(&mut *conn, item).await?;
    }

    Ok(PurchaseOrderDetail { order, items })
}

async fn receive_in(
    conn: &mut SqliteConnection,
    actor: &Actor,
    order_id: &str,
    request: &ReceivePurchaseOrder,
) -> DbResult<(PurchaseOrderDetail, Vec<LowStockAlert>)> {
    let mut order = purchase_order::fetch_order(&mut *conn, order_id)
        .await?
        .ok_or_else(|| CoreError::PurchaseOrderNotFound(order_id.to_string()))?;
    ensure_open(&order)?;

    let mut items = purchase_order::fetch_items(&mut *conn, order_id).await?;
    let applied = apply_receipt(order_id, &mut items, &request.lines)?;
    let status = derive_status(&order, &items, !applied.is_empty(), request.target_status)?;

    let mut alerts = Vec::new();
    for receipt in &applied {
        purchase_order::set_received(&mut *conn, &receipt.item_id, receipt.received_total).await?;

        let change = StockMutator::adjust(
            &mut *conn,
            actor,
            StockAdjustment::new(&receipt.product_id, receipt.quantity, MovementType::PurchaseEntry)
                .reason(format!("Received from PO {order_id}"))
                .correlation(Correlation::purchase_order(order_id)),
        )
        .await?;
        alerts.extend(change.low_stock);
    }

    let now = Utc::now();
    let received_at = match status {
        PurchaseOrderStatus::FullyReceived => Some(now),
        _ => order.received_at,
    };
    purchase_order::set_status(&mut *conn, order_id, status, received_at, now).await?;

    order.status = status;
    order.received_at = received_at;
    order.updated_at = now;
    Ok((PurchaseOrderDetail { order, items }, alerts))
}

async fn cancel_in(conn: &mut SqliteConnection, order_id: &str) -> DbResult<PurchaseOrderDetail> {
    let mut detail = purchase_order::fetch_detail(&mut *conn, order_id)
        .await?
        .ok_or_else(|| CoreError::PurchaseOrderNotFound(order_id.to_string()))?;
    ensure_open(&detail.order)?;

    let now = Utc::now();
    purchase_order::set_status(
        &mut *conn,
        order_id,
        PurchaseOrderStatus::Cancelled,
        detail.order.received_at,
        now,
    )
    .await?;

    detail.order.status = PurchaseOrderStatus::Cancelled;
    detail.order.updated_at = now;
    Ok(detail)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use stockroom_core::{
        Actor, CoreError, CreatePurchaseOrder, ErrorKind, ItemRef, NewProduct,
        NewPurchaseOrderItem, Product, PurchaseOrderStatus, ReceiptLine, ReceivePurchaseOrder,
    };

    async fn product(db: &Database, sku: &str, stock: i64) -> Product {
        db.products()
            .create(
                &Actor::new("setup").unwrap(),
                NewProduct {
                    sku: sku.into(),
                    name: sku.into(),
                    selling_price_cents: 500,
                    cost_price_cents: 250,
                    minimum_stock: 0,
                    opening_stock: stock,
                },
            )
            .await
            .unwrap()
    }

    fn order(lines: Vec<(&str, i64)>) -> CreatePurchaseOrder {
        CreatePurchaseOrder {
            supplier_id: "SUP-1".into(),
            items: lines
                .into_iter()
                .map(|(product_id, quantity_ordered)| NewPurchaseOrderItem {
                    product_id: product_id.to_string(),
                    quantity_ordered,
                    unit_cost_cents: 250,
                })
                .collect(),
            notes: None,
        }
    }

    fn receipt(lines: Vec<(&str, i64)>) -> ReceivePurchaseOrder {
        ReceivePurchaseOrder {
            lines: lines
                .into_iter()
                .map(|(product_id, quantity)| ReceiptLine {
                    item: ItemRef::Product(product_id.to_string()),
                    quantity_received_now: quantity,
                })
                .collect(),
            target_status: None,
        }
    }

    #[tokio::test]
    async fn test_create_totals_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = product(&db, "A", 0).await;

        let detail = db
            .purchase_orders()
            .create(&Actor::new("buyer").unwrap(), order(vec![(a.id.as_str(), 4)]))
            .await
            .unwrap();
        assert_eq!(detail.order.status, PurchaseOrderStatus::Pending);
        assert_eq!(detail.order.total_cents, 1_000);
        assert_eq!(detail.items[0].quantity_received, 0);
    }

    #[tokio::test]
    async fn test_partial_then_full_receipt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let actor = Actor::new("buyer").unwrap();
        let a = product(&db, "A", 0).await;
        let po = db.purchase_orders().create(&actor, order(vec![(a.id.as_str(), 10)])).await.unwrap();

        let partial = db
            .purchase_orders()
            .receive(&actor, &po.order.id, receipt(vec![(a.id.as_str(), 4)]))
            .await
            .unwrap();
        assert_eq!(partial.order.status, PurchaseOrderStatus::PartiallyReceived);
        assert!(partial.order.received_at.is_none());

        let full = db
            .purchase_orders()
            .receive(&actor, &po.order.id, receipt(vec![(a.id.as_str(), 6)]))
            .await
            .unwrap();
        assert_eq!(full.order.status, PurchaseOrderStatus::FullyReceived);
        assert!(full.order.received_at.is_some());

        let stocked = db.products().get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(stocked.current_stock, 10);

        let closed = db
            .purchase_orders()
            .receive(&actor, &po.order.id, receipt(vec![(a.id.as_str(), 0)]))
            .await
            .unwrap_err();
        assert_eq!(closed.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_duplicate_lines_accumulate_toward_bound() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let actor = Actor::new("buyer").unwrap();
        let a = product(&db, "A", 0).await;
        let po = db.purchase_orders().create(&actor, order(vec![(a.id.as_str(), 5)])).await.unwrap();

        let err = db
            .purchase_orders()
            .receive(&actor, &po.order.id, receipt(vec![(a.id.as_str(), 3), (a.id.as_str(), 3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OverReceipt { .. })));

        let untouched = db.products().get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(untouched.current_stock, 0);
    }

    #[tokio::test]
    async fn test_huge_receipt_is_rejected_as_over_receipt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let actor = Actor::new("buyer").unwrap();
        let a = product(&db, "A", 0).await;
        let po = db.purchase_orders().create(&actor, order(vec![(a.id.as_str(), 10)])).await.unwrap();
        db.purchase_orders()
            .receive(&actor, &po.order.id, receipt(vec![(a.id.as_str(), 4)]))
            .await
            .unwrap();

        let err = db
            .purchase_orders()
            .receive(&actor, &po.order.id, receipt(vec![(a.id.as_str(), i64::MAX)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OverReceipt {
                ordered: 10,
                already_received: 4,
                ..
            })
        ));

        let after = db.purchase_orders().get(&po.order.id).await.unwrap();
        assert_eq!(after.items[0].quantity_received, 4);
        assert_eq!(db.products().get_by_id(&a.id).await.unwrap().unwrap().current_stock, 4);
    }

    #[tokio::test]
    async fn test_oversized_order_lines_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = product(&db, "A", 0).await;

        let mut request = order(vec![(a.id.as_str(), 10)]);
        request.items[0].unit_cost_cents = i64::MAX / 2;
        let err = db
            .purchase_orders()
            .create(&Actor::new("buyer").unwrap(), request)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = db
            .purchase_orders()
            .create(&Actor::new("buyer").unwrap(), order(vec![(a.id.as_str(), i64::MAX)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_fully_received_target_must_be_met() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let actor = Actor::new("buyer").unwrap();
        let a = product(&db, "A", 0).await;
        let po = db.purchase_orders().create(&actor, order(vec![(a.id.as_str(), 5)])).await.unwrap();

        let mut request = receipt(vec![(a.id.as_str(), 2)]);
        request.target_status = Some(PurchaseOrderStatus::FullyReceived);
        let err = db
            .purchase_orders()
            .receive(&actor, &po.order.id, request)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::IncompleteReceipt { .. })));

        let mut request = receipt(vec![(a.id.as_str(), 2)]);
        request.target_status = Some(PurchaseOrderStatus::Cancelled);
        let err = db
            .purchase_orders()
            .receive(&actor, &po.order.id, request)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .purchase_orders()
            .receive(&Actor::new("buyer").unwrap(), "nope", ReceivePurchaseOrder::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cancel_blocks_receiving() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let actor = Actor::new("buyer").unwrap();
        let a = product(&db, "A", 0).await;
        let po = db.purchase_orders().create(&actor, order(vec![(a.id.as_str(), 5)])).await.unwrap();

        let cancelled = db.purchase_orders().cancel(&po.order.id).await.unwrap();
        assert_eq!(cancelled.order.status, PurchaseOrderStatus::Cancelled);

        let err = db
            .purchase_orders()
            .receive(&actor, &po.order.id, receipt(vec![(a.id.as_str(), 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::PurchaseOrderClosed { .. })));
    }
}

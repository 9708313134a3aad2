//! # Return Service
//!
//! Takes goods back against a completed sale and puts them back on the shelf.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate (reason, items, refund ≥ 0) ────────────────► BadRequest      │
//! │  BEGIN                                                                  │
//! │  sale exists? ────────────────────────────────────────► NotFound        │
//! │  sale COMPLETED? ─────────────────────────────────────► Conflict        │
//! │  products exist? ─────────────────────────────────────► NotFound        │
//! │  per product: returned so far + now ≤ sold ───────────► BadRequest      │
//! │  refunded so far + now ≤ sale total ──────────────────► BadRequest      │
//! │  INSERT return, INSERT items                                            │
//! │  StockMutator::adjust(+qty, CUSTOMER_RETURN, return_id + sale_id)       │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::DbResult;
use crate::notify::{dispatch, SharedObserver};
use crate::repository::{product, returns, sale};
use crate::service::finish;
use crate::stock::{StockAdjustment, StockMutator};
use stockroom_core::returns::{check_quantities, check_refund, ensure_completed};
use stockroom_core::validation::{validate_create_return, validate_reason};
use stockroom_core::{
    Actor, CoreError, Correlation, CreateReturn, LowStockAlert, MovementType, ReturnDetail,
    ReturnItem, SaleReturn,
};

#[derive(Clone)]
pub struct ReturnService {
    pool: SqlitePool,
    observer: SharedObserver,
}

impl ReturnService {
    pub fn new(pool: SqlitePool, observer: SharedObserver) -> Self {
        ReturnService { pool, observer }
    }

    pub async fn create(&self, actor: &Actor, request: CreateReturn) -> DbResult<ReturnDetail> {
        validate_create_return(&request)?;
        let reason = validate_reason(&request.reason)?;

        let mut tx = self.pool.begin().await?;
        let outcome = create_in(&mut tx, actor, &request, reason).await;
        let (detail, alerts) = finish(tx, outcome, "return.create").await?;

        info!(
            return_id = %detail.sale_return.id,
            sale_id = %detail.sale_return.original_sale_id,
            items = detail.items.len(),
            refunded_cents = detail.sale_return.refunded_cents,
            "Return processed"
        );
        dispatch(self.observer.as_ref(), &alerts);
        Ok(detail)
    }

    pub async fn get(&self, return_id: &str) -> DbResult<ReturnDetail> {
        let mut conn = self.pool.acquire().await?;
        returns::fetch_detail(&mut conn, return_id)
            .await?
            .ok_or_else(|| CoreError::ReturnNotFound(return_id.to_string()).into())
    }

    /// Every return recorded against `sale_id`, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<ReturnDetail>> {
        let mut conn = self.pool.acquire().await?;
        let ids = returns::ids_for_sale(&mut conn, sale_id).await?;

        let mut details = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(detail) = returns::fetch_detail(&mut conn, &id).await? {
                details.push(detail);
            }
        }
        Ok(details)
    }
}

async fn create_in(
    conn: &mut SqliteConnection,
    actor: &Actor,
    request: &CreateReturn,
    reason: String,
) -> DbResult<(ReturnDetail, Vec<LowStockAlert>)> {
    let sale_id = request.original_sale_id.as_str();
    let original = sale::fetch_detail(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
    ensure_completed(&original.sale)?;

    for line in &request.items {
        product::require(&mut *conn, &line.product_id).await?;
    }

    let returned = returns::returned_quantities(&mut *conn, sale_id).await?;
    let merged = check_quantities(&original, &returned, &request.items)?;

    let refunded = returns::refunded_total(&mut *conn, sale_id).await?;
    check_refund(&original.sale, refunded, request.refunded())?;

    let now = Utc::now();
    let sale_return = SaleReturn {
        id: Uuid::new_v4().to_string(),
        original_sale_id: sale_id.to_string(),
        processed_by_user_id: actor.user_id().to_string(),
        reason,
        refunded_cents: request.refunded_cents,
        created_at: now,
    };
    returns::insert_return(&mut *conn, &sale_return).await?;

    let mut items = Vec::with_capacity(merged.len());
    let mut alerts = Vec::new();
    for line in merged {
        let item = ReturnItem {
            id: Uuid::new_v4().to_string(),
            return_id: sale_return.id.clone(),
            product_id: line.product_id,
            quantity: line.quantity,
            created_at: now,
        };
        returns::insert_item(&mut *conn, &item).await?;

        let change = StockMutator::adjust(
            &mut *conn,
            actor,
            StockAdjustment::new(&item.product_id, item.quantity, MovementType::CustomerReturn)
                .reason(format!(
                    "Return against Sale {} (Return ID: {})",
                    sale_id, sale_return.id
                ))
                .correlation(Correlation::sale_return(&sale_return.id, sale_id)),
        )
        .await?;
        alerts.extend(change.low_stock);
        items.push(item);
    }

    Ok((ReturnDetail { sale_return, items }, alerts))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError, MovementFilter};
    use stockroom_core::{
        Actor, CoreError, CreateReturn, CreateSale, ErrorKind, MovementType, NewProduct,
        PaymentMethod, Product, ReturnLine, SaleDetail, SaleLine,
    };

    async fn setup(stock: i64, sold: i64) -> (Database, Product, SaleDetail) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let actor = Actor::new("clerk").unwrap();
        let product = db
            .products()
            .create(
                &actor,
                NewProduct {
                    sku: "RET-1".into(),
                    name: "Returnable".into(),
                    selling_price_cents: 1_000,
                    cost_price_cents: 400,
                    minimum_stock: 0,
                    opening_stock: stock,
                },
            )
            .await
            .unwrap();
        let sale = db
            .sales()
            .create(
                &actor,
                CreateSale {
                    customer_id: None,
                    payment_method: PaymentMethod::Card,
                    lines: vec![SaleLine {
                        product_id: product.id.clone(),
                        quantity: sold,
                    }],
                    discount: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        (db, product, sale)
    }

    fn request(sale_id: &str, product_id: &str, quantity: i64, refund: i64) -> CreateReturn {
        CreateReturn {
            original_sale_id: sale_id.to_string(),
            reason: "Damaged".into(),
            refunded_cents: refund,
            items: vec![ReturnLine {
                product_id: product_id.to_string(),
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn test_return_restores_stock_and_links_movement() {
        let (db, product, sale) = setup(10, 3).await;
        let actor = Actor::new("clerk").unwrap();

        let detail = db
            .returns()
            .create(&actor, request(&sale.sale.id, &product.id, 2, 2_000))
            .await
            .unwrap();

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.current_stock, 9);

        let movements = db
            .ledger()
            .query(&MovementFilter::for_sale(&sale.sale.id).movement_type(MovementType::CustomerReturn))
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].return_id.as_deref(), Some(detail.sale_return.id.as_str()));
        assert!(movements[0].reason.as_deref().unwrap_or_default().contains(&detail.sale_return.id));

        let fetched = db.returns().get(&detail.sale_return.id).await.unwrap();
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_get_unknown_return_is_not_found() {
        let (db, _, _) = setup(5, 1).await;
        let err = db.returns().get("no-such-return").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err, DbError::Domain(CoreError::ReturnNotFound(_))));
    }

    #[tokio::test]
    async fn test_cumulative_returns_bounded_by_sold() {
        let (db, product, sale) = setup(10, 3).await;
        let actor = Actor::new("clerk").unwrap();

        db.returns()
            .create(&actor, request(&sale.sale.id, &product.id, 2, 0))
            .await
            .unwrap();
        let err = db
            .returns()
            .create(&actor, request(&sale.sale.id, &product.id, 2, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ReturnExceedsSold {
                sold: 3,
                already_returned: 2,
                requested: 2,
                ..
            })
        ));

        let listed = db.returns().list_for_sale(&sale.sale.id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_refund_cannot_exceed_sale_total() {
        let (db, product, sale) = setup(10, 1).await;
        let err = db
            .returns()
            .create(
                &Actor::new("clerk").unwrap(),
                request(&sale.sale.id, &product.id, 1, sale.sale.total_cents + 1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::RefundExceedsSale { .. })));
    }

    #[tokio::test]
    async fn test_unknown_sale_and_product() {
        let (db, product, sale) = setup(10, 1).await;
        let actor = Actor::new("clerk").unwrap();

        let err = db
            .returns()
            .create(&actor, request("missing", &product.id, 1, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = db
            .returns()
            .create(&actor, request(&sale.sale.id, "ghost", 1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancelled_sale_rejects_return() {
        let (db, product, sale) = setup(10, 2).await;
        let actor = Actor::new("clerk").unwrap();
        db.sales().cancel(&actor, &sale.sale.id).await.unwrap();

        let err = db
            .returns()
            .create(&actor, request(&sale.sale.id, &product.id, 1, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_blank_reason_rejected() {
        let (db, product, sale) = setup(10, 2).await;
        let mut bad = request(&sale.sale.id, &product.id, 1, 0);
        bad.reason = "   ".into();
        let err = db
            .returns()
            .create(&Actor::new("clerk").unwrap(), bad)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}

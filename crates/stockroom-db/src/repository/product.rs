//! # Product Repository
//!
//! Product rows and the reads the back office needs.
//!
//! ## Stock Is Not Editable Here
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(NewProduct { opening_stock: 40, .. })                           │
//! │       │                                                                 │
//! │       ▼   one transaction                                               │
//! │  INSERT products (current_stock = 0)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StockMutator::adjust(+40, ADJUSTMENT_IN, "Opening stock")              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ledger sum == current_stock == 40 from the very first commit           │
//! │                                                                         │
//! │  update() changes name, prices, threshold, active flag. Never stock.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::stock::{StockAdjustment, StockMutator};
use stockroom_core::validation::{validate_new_product, validate_product_update};
use stockroom_core::{Actor, CoreError, MovementType, NewProduct, Product, ProductUpdate};

macro_rules! select_product {
    ($tail:literal) => {
        concat!(
            "SELECT id, sku, name, selling_price_cents, cost_price_cents, current_stock, ",
            "minimum_stock, is_active, created_at, updated_at FROM products ",
            $tail
        )
    };
}

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(select_product!("WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}

/// Loads a product or fails with `ProductNotFound`.
pub(crate) async fn require(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    fetch(conn, id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
}

async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, sku, name, selling_price_cents, cost_price_cents,
            current_stock, minimum_stock, is_active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&product.id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(product.selling_price_cents)
    .bind(product.cost_price_cents)
    .bind(product.current_stock)
    .bind(product.minimum_stock)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|err| match DbError::from(err) {
        DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
            field,
            value: product.sku.clone(),
        },
        other => other,
    })?;

    Ok(())
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let widget = repo.create(&actor, new_product).await?;
/// let low = repo.low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Registers a product, booking any opening stock through the ledger.
    pub async fn create(&self, actor: &Actor, new: NewProduct) -> DbResult<Product> {
        validate_new_product(&new)?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            selling_price_cents: new.selling_price_cents,
            cost_price_cents: new.cost_price_cents,
            current_stock: 0,
            minimum_stock: new.minimum_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;
        insert(&mut tx, &product).await?;

        let product = if new.opening_stock > 0 {
            let change = StockMutator::adjust(
                &mut tx,
                actor,
                StockAdjustment::new(&product.id, new.opening_stock, MovementType::AdjustmentIn)
                    .reason("Opening stock"),
            )
            .await?;
            change.product
        } else {
            product
        };

        tx.commit().await?;

        info!(
            product_id = %product.id,
            sku = %product.sku,
            opening_stock = product.current_stock,
            "Product created"
        );
        Ok(product)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(select_product!("WHERE sku = ?1"))
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Active products ordered by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(select_product!(
            "WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Active products at or below their minimum stock, ordered by name.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(select_product!(
            "WHERE is_active = 1 AND current_stock <= minimum_stock ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Low-stock report");
        Ok(products)
    }

    /// Applies a partial update. `current_stock` is never touched.
    pub async fn update(&self, id: &str, update: ProductUpdate) -> DbResult<Product> {
        validate_product_update(&update)?;

        let mut tx = self.pool.begin().await?;
        let mut product = require(&mut tx, id).await?;

        if let Some(name) = update.name {
            product.name = name.trim().to_string();
        }
        if let Some(price) = update.selling_price_cents {
            product.selling_price_cents = price;
        }
        if let Some(cost) = update.cost_price_cents {
            product.cost_price_cents = cost;
        }
        if let Some(minimum) = update.minimum_stock {
            product.minimum_stock = minimum;
        }
        if let Some(active) = update.is_active {
            product.is_active = active;
        }
        product.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?1, selling_price_cents = ?2, cost_price_cents = ?3,
                minimum_stock = ?4, is_active = ?5, updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&product.name)
        .bind(product.selling_price_cents)
        .bind(product.cost_price_cents)
        .bind(product.minimum_stock)
        .bind(product.is_active)
        .bind(product.updated_at)
        .bind(&product.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Soft delete: inactive products cannot be sold.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

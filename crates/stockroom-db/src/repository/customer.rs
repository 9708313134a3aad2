//! # Customer Repository
//!
//! Customers are referenced by sales only; this is just enough to register
//! them and check that one exists.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use stockroom_core::validation::validate_product_name;
use stockroom_core::Customer;

pub(crate) async fn exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = ?1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(found)
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn create(&self, name: &str, email: Option<&str>) -> DbResult<Customer> {
        // Same length rules as a product name.
        validate_product_name(name)?;

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.map(|e| e.trim().to_string()),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO customers (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(customer.created_at)
            .execute(&self.pool)
            .await?;

        debug!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }
}

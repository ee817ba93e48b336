use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::orders::models::Order;

/// Order persistence used by the settlement core
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Order>>;

    /// Orders shown in normal listings (synthetic gateway orders excluded), newest first
    async fn list_visible(&self, limit: i64, offset: i64) -> Result<Vec<Order>>;

    async fn create(&self, order: &Order) -> Result<Order>;

    async fn update(&self, order: &Order) -> Result<()>;

    /// Returns false when no row existed
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// MySQL-backed order repository
#[derive(Clone)]
pub struct MySqlOrderRepository {
    pool: MySqlPool,
}

impl MySqlOrderRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_type, date, counterparty_name, supplier_ref, user_ref,
                   total, created_at, updated_at
            FROM orders
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn list_visible(&self, limit: i64, offset: i64) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_type, date, counterparty_name, supplier_ref, user_ref,
                   total, created_at, updated_at
            FROM orders
            WHERE order_type <> 'gateway_payment'
            ORDER BY date DESC, created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn create(&self, order: &Order) -> Result<Order> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_type, date, counterparty_name, supplier_ref, user_ref,
                total, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(order.order_type)
        .bind(order.date)
        .bind(&order.counterparty_name)
        .bind(&order.supplier_ref)
        .bind(&order.user_ref)
        .bind(order.total)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(order.clone())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET date = ?, counterparty_name = ?, supplier_ref = ?, user_ref = ?,
                total = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(order.date)
        .bind(&order.counterparty_name)
        .bind(&order.supplier_ref)
        .bind(&order.user_ref)
        .bind(order.total)
        .bind(order.updated_at)
        .bind(&order.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Order '{}' not found", order.id)));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Err(
                AppError::Conflict(format!("Order '{}' is still part of a bill", id)),
            ),
            Err(e) => Err(e.into()),
        }
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::payments::models::Payment;

/// Payment persistence
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>>;

    async fn find_by_bill_id(&self, bill_id: &str) -> Result<Vec<Payment>>;

    /// Rows for an order written before bills existed (`bill_id IS NULL`)
    async fn find_legacy_by_order_id(&self, order_id: &str) -> Result<Vec<Payment>>;

    /// Every row for an order, billed or not
    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<Payment>>;

    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>>;

    /// Fails with `Conflict` when the transaction reference already exists
    async fn create(&self, payment: &Payment) -> Result<Payment>;

    /// Persist status, settlement timestamp and notes
    async fn update(&self, payment: &Payment) -> Result<()>;

    /// Gateway payments still pending that were created before `before`
    async fn find_stale_pending(&self, before: DateTime<Utc>) -> Result<Vec<Payment>>;
}

/// MySQL-backed payment repository
#[derive(Clone)]
pub struct MySqlPaymentRepository {
    pool: MySqlPool,
}

impl MySqlPaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, bill_id, order_id, amount, method, status, transaction_id,
           payment_date, notes, created_at, updated_at
    FROM payments
"#;

#[async_trait]
impl PaymentRepository for MySqlPaymentRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!("{} WHERE id = ?", SELECT_PAYMENT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    async fn find_by_bill_id(&self, bill_id: &str) -> Result<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "{} WHERE bill_id = ? ORDER BY created_at",
            SELECT_PAYMENT
        ))
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn find_legacy_by_order_id(&self, order_id: &str) -> Result<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "{} WHERE order_id = ? AND bill_id IS NULL ORDER BY created_at",
            SELECT_PAYMENT
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "{} WHERE order_id = ? ORDER BY created_at",
            SELECT_PAYMENT
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "{} WHERE transaction_id = ?",
            SELECT_PAYMENT
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn create(&self, payment: &Payment) -> Result<Payment> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (
                id, bill_id, order_id, amount, method, status, transaction_id,
                payment_date, notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.bill_id)
        .bind(&payment.order_id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(payment.status)
        .bind(&payment.transaction_id)
        .bind(payment.payment_date)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(payment.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::Conflict(format!(
                    "Payment with transaction reference '{}' already exists",
                    payment.transaction_id.as_deref().unwrap_or_default()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, payment_date = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(payment.status)
        .bind(payment.payment_date)
        .bind(&payment.notes)
        .bind(payment.updated_at)
        .bind(&payment.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Payment '{}' not found", payment.id)));
        }

        Ok(())
    }

    async fn find_stale_pending(&self, before: DateTime<Utc>) -> Result<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "{} WHERE status = 'pending' AND method IN ('vnpay', 'momo', 'zalopay') AND created_at < ? ORDER BY created_at",
            SELECT_PAYMENT
        ))
        .bind(before)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}

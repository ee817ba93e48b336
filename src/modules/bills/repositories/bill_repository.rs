use async_trait::async_trait;
use sqlx::{MySqlPool, Row};

use crate::core::{AppError, Result};
use crate::modules::bills::models::Bill;

/// Bill persistence, including the bill/order join
#[async_trait]
pub trait BillRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Bill>>;

    /// Bills covering an order, any status
    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<Bill>>;

    async fn create(&self, bill: &Bill) -> Result<Bill>;

    /// Persist total, status and notes
    async fn update(&self, bill: &Bill) -> Result<()>;

    /// Returns false when no row existed
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// MySQL-backed bill repository
#[derive(Clone)]
pub struct MySqlBillRepository {
    pool: MySqlPool,
}

impl MySqlBillRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn load_order_ids(&self, bill: &mut Bill) -> Result<()> {
        let rows = sqlx::query("SELECT order_id FROM bill_orders WHERE bill_id = ? ORDER BY order_id")
            .bind(&bill.id)
            .fetch_all(&self.pool)
            .await?;

        bill.order_ids = rows
            .iter()
            .map(|row| row.try_get::<String, _>("order_id"))
            .collect::<std::result::Result<_, _>>()?;

        Ok(())
    }
}

#[async_trait]
impl BillRepository for MySqlBillRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(
            r#"
            SELECT id, total_amount, status, notes, created_at, updated_at
            FROM bills
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut bill) = bill else {
            return Ok(None);
        };
        self.load_order_ids(&mut bill).await?;

        Ok(Some(bill))
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<Bill>> {
        let mut bills = sqlx::query_as::<_, Bill>(
            r#"
            SELECT b.id, b.total_amount, b.status, b.notes, b.created_at, b.updated_at
            FROM bills b
            INNER JOIN bill_orders bo ON bo.bill_id = b.id
            WHERE bo.order_id = ?
            ORDER BY b.created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        for bill in bills.iter_mut() {
            self.load_order_ids(bill).await?;
        }

        Ok(bills)
    }

    async fn create(&self, bill: &Bill) -> Result<Bill> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bills (id, total_amount, status, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&bill.id)
        .bind(bill.total_amount)
        .bind(bill.status)
        .bind(&bill.notes)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&mut *tx)
        .await?;

        for order_id in &bill.order_ids {
            sqlx::query("INSERT INTO bill_orders (bill_id, order_id) VALUES (?, ?)")
                .bind(&bill.id)
                .bind(order_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(bill.clone())
    }

    async fn update(&self, bill: &Bill) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE bills
            SET total_amount = ?, status = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(bill.total_amount)
        .bind(bill.status)
        .bind(&bill.notes)
        .bind(bill.updated_at)
        .bind(&bill.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Bill '{}' not found", bill.id)));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM bill_orders WHERE bill_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM bills WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

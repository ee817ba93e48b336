use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::core::{AppError, Result, SettlementLock, SettlementLocks};
use crate::modules::orders::models::{Order, OrderPayload};
use crate::modules::orders::repositories::OrderRepository;
use crate::modules::payments::services::{ReconciliationEngine, Settlement, SettlementGuard};

/// Order reads and guarded order writes
pub struct OrderService {
    order_repo: Arc<dyn OrderRepository>,
    reconciliation: Arc<ReconciliationEngine>,
    guard: Arc<SettlementGuard>,
    locks: Arc<SettlementLocks>,
}

impl OrderService {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        reconciliation: Arc<ReconciliationEngine>,
        guard: Arc<SettlementGuard>,
        locks: Arc<SettlementLocks>,
    ) -> Self {
        Self {
            order_repo,
            reconciliation,
            guard,
            locks,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Order> {
        self.order_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order '{}' not found", id)))
    }

    /// Listed orders only; gateway anchors are hidden
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Order>> {
        if !(1..=200).contains(&limit) {
            return Err(AppError::validation("Limit must be between 1 and 200"));
        }
        if offset < 0 {
            return Err(AppError::validation("Offset cannot be negative"));
        }
        self.order_repo.list_visible(limit, offset).await
    }

    pub async fn update(&self, id: &str, payload: OrderPayload) -> Result<Order> {
        let _locks = self.lock_for_write(id).await?;

        let mut order = self.get(id).await?;
        self.guard.ensure_order_editable(&order).await?;

        order.apply(payload)?;
        self.order_repo.update(&order).await?;

        info!(order_id = %order.id, order_type = %order.order_type, "Order updated");
        Ok(order)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let _locks = self.lock_for_write(id).await?;

        let order = self.get(id).await?;
        self.guard.ensure_order_deletable(&order).await?;

        if !self.order_repo.delete(id).await? {
            return Err(AppError::not_found(format!("Order '{}' not found", id)));
        }

        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    /// Take the locks of every live bill covering the order, then the order's own.
    ///
    /// Bill keys are taken in id order before the order key. Returns the held
    /// locks and the bill ids they cover; retries if a bill appeared meanwhile.
    pub async fn lock_for_write(&self, id: &str) -> Result<(Vec<SettlementLock>, Vec<String>)> {
        loop {
            let bill_ids = self.open_bill_ids(id).await?;

            let mut held = Vec::with_capacity(bill_ids.len() + 1);
            for bill_id in &bill_ids {
                held.push(self.locks.lock_bill(bill_id).await);
            }
            held.push(self.locks.lock_order(id).await);

            if self.open_bill_ids(id).await? == bill_ids {
                return Ok((held, bill_ids));
            }
            tracing::debug!(order_id = %id, "Bills changed while locking order; retrying");
        }
    }

    async fn open_bill_ids(&self, id: &str) -> Result<Vec<String>> {
        Ok(self
            .reconciliation
            .open_bills_for_order(id)
            .await?
            .into_iter()
            .map(|bill| bill.id)
            .collect())
    }

    pub async fn settlement(&self, id: &str) -> Result<Settlement> {
        self.reconciliation.compute_order_settlement(id).await
    }

    /// Synthetic order anchoring a gateway payment started from a bill
    pub async fn create_gateway_anchor(&self, amount: Decimal) -> Result<Order> {
        let order = Order::gateway_anchor(amount)?;
        let order = self.order_repo.create(&order).await?;

        info!(order_id = %order.id, amount = %amount, "Gateway anchor order created");
        Ok(order)
    }
}

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::core::{AppError, Result, SettlementLocks};
use crate::modules::bills::models::{Bill, BillPayload, BillStatus, CreateBillRequest};
use crate::modules::bills::repositories::BillRepository;
use crate::modules::orders::models::OrderType;
use crate::modules::orders::repositories::OrderRepository;
use crate::modules::payments::services::{ReconciliationEngine, Settlement, SettlementGuard};

/// Bill lifecycle: checkout, guarded edits, cancellation and promotion to paid
pub struct BillService {
    bill_repo: Arc<dyn BillRepository>,
    order_repo: Arc<dyn OrderRepository>,
    reconciliation: Arc<ReconciliationEngine>,
    guard: Arc<SettlementGuard>,
    locks: Arc<SettlementLocks>,
}

impl BillService {
    pub fn new(
        bill_repo: Arc<dyn BillRepository>,
        order_repo: Arc<dyn OrderRepository>,
        reconciliation: Arc<ReconciliationEngine>,
        guard: Arc<SettlementGuard>,
        locks: Arc<SettlementLocks>,
    ) -> Self {
        Self {
            bill_repo,
            order_repo,
            reconciliation,
            guard,
            locks,
        }
    }

    /// Checkout: open a pending bill for existing orders.
    ///
    /// The total defaults to the sum of the order totals.
    pub async fn create_for_orders(&self, request: CreateBillRequest) -> Result<Bill> {
        let mut order_total = Decimal::ZERO;
        for order_id in &request.order_ids {
            let order = self
                .order_repo
                .find_by_id(order_id.trim())
                .await?
                .ok_or_else(|| AppError::not_found(format!("Order '{}' not found", order_id)))?;

            if order.order_type == OrderType::GatewayPayment {
                return Err(AppError::validation(format!(
                    "Order '{}' is a gateway payment anchor and cannot be billed",
                    order.id
                )));
            }
            order_total += order.total;
        }

        let total_amount = request.total_amount.unwrap_or(order_total);
        let bill = Bill::new(request.order_ids, total_amount, request.notes)?;

        // Bill key first, then its orders in id order
        let _lock = self.locks.lock_bill(&bill.id).await;
        let mut _order_locks = Vec::with_capacity(bill.order_ids.len());
        for order_id in &bill.order_ids {
            _order_locks.push(self.locks.lock_order(order_id).await);
        }
        let bill = self.bill_repo.create(&bill).await?;

        info!(
            bill_id = %bill.id,
            orders = bill.order_ids.len(),
            total = %bill.total_amount,
            "Bill created"
        );

        // Legacy payments for a single order may already cover it
        Ok(self.promote_if_settled(&bill.id).await?.unwrap_or(bill))
    }

    pub async fn get(&self, id: &str) -> Result<Bill> {
        self.bill_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Bill '{}' not found", id)))
    }

    pub async fn update(&self, id: &str, payload: BillPayload) -> Result<Bill> {
        let _lock = self.locks.lock_bill(id).await;

        let mut bill = self.get(id).await?;
        self.guard.ensure_bill_mutable(&bill).await?;

        if bill.status == BillStatus::Cancelled {
            return Err(AppError::invalid_transition(format!(
                "bill '{}' is cancelled",
                bill.id
            )));
        }

        if let Some(total_amount) = payload.total_amount {
            if total_amount <= Decimal::ZERO {
                return Err(AppError::validation("Bill total must be greater than 0"));
            }
            bill.total_amount = total_amount;
        }
        if payload.notes.is_some() {
            bill.notes = payload.notes;
        }
        if let Some(status) = payload.status {
            bill.transition(status)?;
        }
        bill.updated_at = chrono::Utc::now();

        self.bill_repo.update(&bill).await?;
        info!(bill_id = %bill.id, status = %bill.status, total = %bill.total_amount, "Bill updated");

        Ok(self.promote_if_settled(&bill.id).await?.unwrap_or(bill))
    }

    pub async fn cancel(&self, id: &str) -> Result<Bill> {
        let _lock = self.locks.lock_bill(id).await;

        let mut bill = self.get(id).await?;
        self.guard.ensure_bill_mutable(&bill).await?;

        bill.transition(BillStatus::Cancelled)?;
        self.bill_repo.update(&bill).await?;

        info!(bill_id = %bill.id, "Bill cancelled");
        Ok(bill)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let _lock = self.locks.lock_bill(id).await;

        let bill = self.get(id).await?;
        self.guard.ensure_bill_mutable(&bill).await?;

        if !self.bill_repo.delete(id).await? {
            return Err(AppError::not_found(format!("Bill '{}' not found", id)));
        }

        info!(bill_id = %id, "Bill deleted");
        Ok(())
    }

    pub async fn settlement(&self, id: &str) -> Result<Settlement> {
        self.reconciliation.compute_settlement(id).await
    }

    /// Move a pending bill to paid once completed payments cover it.
    ///
    /// Caller holds the bill's settlement lock. Returns the bill when it was promoted.
    pub async fn promote_if_settled(&self, bill_id: &str) -> Result<Option<Bill>> {
        let Some(mut bill) = self.bill_repo.find_by_id(bill_id).await? else {
            return Ok(None);
        };
        if bill.status != BillStatus::Pending {
            return Ok(None);
        }

        let settlement = self.reconciliation.settle(&bill).await?;
        if !settlement.is_fully_paid {
            return Ok(None);
        }

        bill.transition(BillStatus::Paid)?;
        self.bill_repo.update(&bill).await?;

        info!(
            bill_id = %bill.id,
            total = %settlement.total_amount,
            paid = %settlement.total_paid,
            "Bill settled"
        );
        Ok(Some(bill))
    }
}

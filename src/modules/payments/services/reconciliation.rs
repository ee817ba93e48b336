use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::{AppError, Result};
use crate::modules::bills::models::{Bill, BillStatus};
use crate::modules::bills::repositories::BillRepository;
use crate::modules::orders::repositories::OrderRepository;
use crate::modules::payments::models::{Payment, PaymentStatus};
use crate::modules::payments::repositories::PaymentRepository;

/// Aggregated settlement state of a bill or order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub total_amount: Decimal,

    /// Sum of completed payments
    pub total_paid: Decimal,

    /// Amount still owed, never negative
    pub balance: Decimal,

    pub is_fully_paid: bool,
    pub completed_payments: usize,
    pub pending_payments: usize,
}

impl Settlement {
    /// Aggregate `payments` against `total_amount`.
    ///
    /// Only `completed` rows count toward the paid total.
    pub fn compute(total_amount: Decimal, payments: &[Payment]) -> Self {
        let completed = payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Completed);

        let total_paid: Decimal = completed.clone().map(|p| p.amount).sum();
        let completed_payments = completed.count();
        let pending_payments = payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending)
            .count();

        Self {
            total_amount,
            total_paid,
            balance: (total_amount - total_paid).max(Decimal::ZERO),
            is_fully_paid: is_fully_paid(total_amount, total_paid),
            completed_payments,
            pending_payments,
        }
    }

    /// Settlement of a bill; cancelled bills never count as paid
    pub fn for_bill(bill: &Bill, payments: &[Payment]) -> Self {
        let mut settlement = Self::compute(bill.total_amount, payments);
        if bill.status == BillStatus::Cancelled {
            settlement.is_fully_paid = false;
        }
        settlement
    }
}

pub fn is_fully_paid(total_amount: Decimal, total_paid: Decimal) -> bool {
    total_amount > Decimal::ZERO && total_paid >= total_amount
}

/// Read-only view over bills, orders and payments that derives settlement.
///
/// Never writes; every caller that needs to know whether something is
/// settled goes through here.
pub struct ReconciliationEngine {
    bill_repo: Arc<dyn BillRepository>,
    order_repo: Arc<dyn OrderRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
}

impl ReconciliationEngine {
    pub fn new(
        bill_repo: Arc<dyn BillRepository>,
        order_repo: Arc<dyn OrderRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            bill_repo,
            order_repo,
            payment_repo,
        }
    }

    /// Payments counted toward a bill.
    ///
    /// Rows linked by `bill_id` win. When there are none and the bill covers a
    /// single order, legacy rows for that order without a bill are used.
    pub async fn payments_for_bill(&self, bill: &Bill) -> Result<Vec<Payment>> {
        let payments = self.payment_repo.find_by_bill_id(&bill.id).await?;
        if !payments.is_empty() {
            return Ok(payments);
        }

        match bill.single_order_id() {
            Some(order_id) => {
                let legacy = self.payment_repo.find_legacy_by_order_id(order_id).await?;
                if !legacy.is_empty() {
                    tracing::debug!(
                        bill_id = %bill.id,
                        order_id = %order_id,
                        count = legacy.len(),
                        "Using legacy order payments for bill"
                    );
                }
                Ok(legacy)
            }
            None => Ok(payments),
        }
    }

    pub async fn settle(&self, bill: &Bill) -> Result<Settlement> {
        let payments = self.payments_for_bill(bill).await?;
        Ok(Settlement::for_bill(bill, &payments))
    }

    pub async fn compute_settlement(&self, bill_id: &str) -> Result<Settlement> {
        let bill = self
            .bill_repo
            .find_by_id(bill_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Bill '{}' not found", bill_id)))?;

        self.settle(&bill).await
    }

    /// Settlement of a single order.
    ///
    /// An order on a live bill is settled through that bill, so only its rows
    /// without a bill count here. Unbilled orders count every row naming them.
    pub async fn compute_order_settlement(&self, order_id: &str) -> Result<Settlement> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order '{}' not found", order_id)))?;

        let payments = if self.open_bills_for_order(order_id).await?.is_empty() {
            self.payment_repo.find_by_order_id(order_id).await?
        } else {
            self.payment_repo.find_legacy_by_order_id(order_id).await?
        };
        Ok(Settlement::compute(order.total, &payments))
    }

    /// Non-cancelled bills covering the order, sorted by id
    pub async fn open_bills_for_order(&self, order_id: &str) -> Result<Vec<Bill>> {
        let mut bills: Vec<Bill> = self
            .bill_repo
            .find_by_order_id(order_id)
            .await?
            .into_iter()
            .filter(|bill| bill.status != BillStatus::Cancelled)
            .collect();
        bills.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(bills)
    }

    /// The live bill a payment naming only `order_id` belongs to
    pub async fn bill_for_order(&self, order_id: &str) -> Result<Option<String>> {
        let mut bills = self.open_bills_for_order(order_id).await?;
        match bills.len() {
            0 => Ok(None),
            1 => Ok(bills.pop().map(|bill| bill.id)),
            _ => Err(AppError::validation(format!(
                "Order '{}' is on several bills; pay through billId",
                order_id
            ))),
        }
    }

    /// True when any non-cancelled bill covering the order is paid or fully covered
    pub async fn order_has_settled_bill(&self, order_id: &str) -> Result<bool> {
        for bill in self.bill_repo.find_by_order_id(order_id).await? {
            match bill.status {
                BillStatus::Paid => return Ok(true),
                BillStatus::Cancelled => continue,
                BillStatus::Pending => {
                    if self.settle(&bill).await?.is_fully_paid {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}

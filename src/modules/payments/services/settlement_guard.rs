use std::sync::Arc;

use tracing::warn;

use super::reconciliation::ReconciliationEngine;
use crate::core::{AppError, Result};
use crate::modules::bills::models::{Bill, BillStatus};
use crate::modules::orders::models::{Order, OrderType};

/// Server-side check that blocks mutation of settled bills and orders.
///
/// Every bill/order edit and delete path calls into this before writing.
pub struct SettlementGuard {
    reconciliation: Arc<ReconciliationEngine>,
}

impl SettlementGuard {
    pub fn new(reconciliation: Arc<ReconciliationEngine>) -> Self {
        Self { reconciliation }
    }

    /// Reject edits and deletes of a paid or fully covered bill
    pub async fn ensure_bill_mutable(&self, bill: &Bill) -> Result<()> {
        if bill.status == BillStatus::Paid {
            return Err(violation("bill", &bill.id, "status is paid"));
        }

        if self.reconciliation.settle(bill).await?.is_fully_paid {
            return Err(violation("bill", &bill.id, "completed payments cover the total"));
        }

        Ok(())
    }

    /// Sale orders cannot be edited once settled; other types stay editable
    pub async fn ensure_order_editable(&self, order: &Order) -> Result<()> {
        if order.order_type != OrderType::Sale {
            return Ok(());
        }
        self.ensure_order_unsettled(order).await
    }

    pub async fn ensure_order_deletable(&self, order: &Order) -> Result<()> {
        self.ensure_order_unsettled(order).await
    }

    async fn ensure_order_unsettled(&self, order: &Order) -> Result<()> {
        if self.reconciliation.order_has_settled_bill(&order.id).await? {
            return Err(violation("order", &order.id, "a bill covering it is settled"));
        }

        if self
            .reconciliation
            .compute_order_settlement(&order.id)
            .await?
            .is_fully_paid
        {
            return Err(violation("order", &order.id, "completed payments cover the total"));
        }

        Ok(())
    }
}

fn violation(kind: &str, id: &str, reason: &str) -> AppError {
    warn!(target_kind = kind, target_id = %id, reason = reason, "Settlement guard rejected mutation");
    AppError::settlement_violation(format!("{} '{}'", kind, id))
}

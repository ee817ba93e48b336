use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Bill status lifecycle
///
/// ```text
/// pending --(fully paid / admin)--> paid        terminal, immutable
/// pending --(admin)-------------> cancelled   terminal, not reconciled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

impl BillStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BillStatus::Pending)
    }

    pub fn can_transition_to(&self, next: BillStatus) -> bool {
        matches!(
            (self, next),
            (BillStatus::Pending, BillStatus::Paid) | (BillStatus::Pending, BillStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillStatus::Pending => write!(f, "pending"),
            BillStatus::Paid => write!(f, "paid"),
            BillStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BillStatus::Pending),
            "paid" => Ok(BillStatus::Paid),
            "cancelled" => Ok(BillStatus::Cancelled),
            _ => Err(format!("Invalid bill status: {}", s)),
        }
    }
}

/// Amount owed against one or more orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,

    /// Linked orders (stored in `bill_orders`)
    #[sqlx(skip)]
    #[serde(default)]
    pub order_ids: Vec<String>,

    pub total_amount: Decimal,
    pub status: BillStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// New pending bill for the given orders
    pub fn new(order_ids: Vec<String>, total_amount: Decimal, notes: Option<String>) -> Result<Self> {
        let mut order_ids: Vec<String> = order_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        order_ids.sort();
        order_ids.dedup();

        if order_ids.is_empty() {
            return Err(AppError::validation("A bill must cover at least one order"));
        }

        if total_amount <= Decimal::ZERO {
            return Err(AppError::validation("Bill total must be greater than 0"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            order_ids,
            total_amount,
            status: BillStatus::Pending,
            notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// The only order when the bill covers exactly one
    pub fn single_order_id(&self) -> Option<&str> {
        match self.order_ids.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    pub fn covers_order(&self, order_id: &str) -> bool {
        self.order_ids.iter().any(|id| id == order_id)
    }

    /// Move along the status state machine
    pub fn transition(&mut self, next: BillStatus) -> Result<()> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(AppError::invalid_transition(format!(
                "bill '{}' cannot go from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Checkout request creating a bill
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    #[serde(alias = "order_ids")]
    pub order_ids: Vec<String>,

    /// Defaults to the sum of the order totals
    #[serde(default, alias = "total_amount", alias = "total")]
    pub total_amount: Option<Decimal>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Fields editable on a pending bill
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPayload {
    #[serde(default, alias = "total_amount", alias = "total")]
    pub total_amount: Option<Decimal>,

    #[serde(default)]
    pub status: Option<BillStatus>,

    #[serde(default)]
    pub notes: Option<String>,
}

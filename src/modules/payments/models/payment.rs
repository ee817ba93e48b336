use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};
use crate::modules::gateways::models::GatewayProvider;

/// How a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Vnpay,
    Momo,
    Zalopay,
    BankTransfer,
    CreditCard,
    Other,
}

impl PaymentMethod {
    /// Settled only through a verified provider callback
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Vnpay | PaymentMethod::Momo | PaymentMethod::Zalopay
        )
    }
}

impl From<GatewayProvider> for PaymentMethod {
    fn from(provider: GatewayProvider) -> Self {
        match provider {
            GatewayProvider::Vnpay => PaymentMethod::Vnpay,
            GatewayProvider::Momo => PaymentMethod::Momo,
            GatewayProvider::Zalopay => PaymentMethod::Zalopay,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Vnpay => "vnpay",
            PaymentMethod::Momo => "momo",
            PaymentMethod::Zalopay => "zalopay",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Other => "other",
        };
        f.write_str(s)
    }
}

/// Payment status lifecycle
///
/// ```text
/// pending --(verified success callback)--> completed --(admin)--> refunded
/// pending --(verified failure / expiry)--> failed
/// cash is created directly in completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Completed)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Completed, PaymentStatus::Refunded)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Payment record
///
/// `bill_id` is absent on legacy rows written before bills existed; those are
/// matched to a bill through `order_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub bill_id: Option<String>,
    pub order_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,

    /// Gateway transaction reference; unique, idempotency key for callbacks
    pub transaction_id: Option<String>,

    /// Settlement timestamp, set when the payment completes
    pub payment_date: Option<DateTime<Utc>>,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    fn base(
        bill_id: Option<String>,
        order_id: String,
        amount: Decimal,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<Self> {
        if order_id.trim().is_empty() {
            return Err(AppError::validation("Order ID is required"));
        }
        Currency::VND.validate_amount(amount)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            bill_id,
            order_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            payment_date: None,
            notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Cash is settled on receipt
    pub fn cash(
        bill_id: Option<String>,
        order_id: String,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<Self> {
        let mut payment = Self::base(bill_id, order_id, amount, PaymentMethod::Cash, notes)?;
        payment.status = PaymentStatus::Completed;
        payment.payment_date = Some(payment.created_at);
        Ok(payment)
    }

    /// Non-gateway, non-cash payment awaiting admin confirmation
    pub fn manual(
        bill_id: Option<String>,
        order_id: String,
        amount: Decimal,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<Self> {
        if method.is_gateway() {
            return Err(AppError::validation(format!(
                "{} payments must be started through gateway checkout",
                method
            )));
        }
        if method == PaymentMethod::Cash {
            return Self::cash(bill_id, order_id, amount, notes);
        }
        Self::base(bill_id, order_id, amount, method, notes)
    }

    /// Pending gateway payment keyed by the provider transaction reference
    pub fn gateway_pending(
        bill_id: Option<String>,
        order_id: String,
        amount: Decimal,
        provider: GatewayProvider,
        transaction_ref: String,
    ) -> Result<Self> {
        if transaction_ref.trim().is_empty() {
            return Err(AppError::validation("Transaction reference cannot be empty"));
        }
        let mut payment = Self::base(bill_id, order_id, amount, provider.into(), None)?;
        payment.transaction_id = Some(transaction_ref);
        Ok(payment)
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Move along the status state machine; completing stamps `payment_date`
    pub fn transition(&mut self, next: PaymentStatus, at: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::invalid_transition(format!(
                "payment '{}' cannot go from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        if next == PaymentStatus::Completed {
            self.payment_date = Some(at);
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Manual payment recorded by an admin
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(default, alias = "bill_id")]
    pub bill_id: Option<String>,

    #[serde(default, alias = "order_id")]
    pub order_id: Option<String>,

    pub amount: Decimal,

    #[serde(alias = "payment_method")]
    pub method: PaymentMethod,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Admin edit of a payment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    #[serde(default)]
    pub status: Option<PaymentStatus>,

    #[serde(default)]
    pub notes: Option<String>,
}

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Order category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Sale,
    Import,
    Export,
    /// Synthetic order created only to anchor a gateway payment
    GatewayPayment,
}

impl OrderType {
    /// Shown in normal order listings
    pub fn is_listed(&self) -> bool {
        !matches!(self, OrderType::GatewayPayment)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Sale => write!(f, "sale"),
            OrderType::Import => write!(f, "import"),
            OrderType::Export => write!(f, "export"),
            OrderType::GatewayPayment => write!(f, "gateway_payment"),
        }
    }
}

impl std::str::FromStr for OrderType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sale" => Ok(OrderType::Sale),
            "import" => Ok(OrderType::Import),
            "export" => Ok(OrderType::Export),
            "gateway_payment" => Ok(OrderType::GatewayPayment),
            _ => Err(AppError::validation(format!("Invalid order type: {}", s))),
        }
    }
}

/// Canonical order shape used inside the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_type: OrderType,
    pub date: NaiveDate,
    /// Customer for sales, supplier name for imports
    pub counterparty_name: Option<String>,
    pub supplier_ref: Option<String>,
    pub user_ref: Option<String>,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(order_type: OrderType, total: Decimal) -> Result<Self> {
        if total < Decimal::ZERO {
            return Err(AppError::validation("Order total cannot be negative"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            order_type,
            date: now.date_naive(),
            counterparty_name: None,
            supplier_ref: None,
            user_ref: None,
            total,
            created_at: now,
            updated_at: now,
        })
    }

    /// Anchor order for a gateway payment that was started from a bill
    pub fn gateway_anchor(amount: Decimal) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("Gateway payment amount must be greater than 0"));
        }
        Self::new(OrderType::GatewayPayment, amount)
    }

    /// Apply an edit payload; `order_type` cannot change
    pub fn apply(&mut self, payload: OrderPayload) -> Result<()> {
        if let Some(order_type) = payload.order_type {
            if order_type != self.order_type {
                return Err(AppError::validation("Order type cannot be changed"));
            }
        }
        if let Some(total) = payload.total {
            if total < Decimal::ZERO {
                return Err(AppError::validation("Order total cannot be negative"));
            }
            self.total = total;
        }
        if let Some(date) = payload.date {
            self.date = date;
        }
        if payload.counterparty_name.is_some() {
            self.counterparty_name = payload.counterparty_name;
        }
        if payload.supplier_ref.is_some() {
            self.supplier_ref = payload.supplier_ref;
        }
        if payload.user_ref.is_some() {
            self.user_ref = payload.user_ref;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Order fields accepted at the HTTP boundary.
///
/// Clients send the counterparty under several spellings; they are folded
/// into one field here so nothing downstream has to guess.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(alias = "type", alias = "order_type")]
    pub order_type: Option<OrderType>,

    pub date: Option<NaiveDate>,

    #[serde(
        alias = "counterparty_name",
        alias = "customerName",
        alias = "customer_name",
        alias = "supplierName",
        alias = "supplier_name"
    )]
    pub counterparty_name: Option<String>,

    #[serde(alias = "supplier_ref", alias = "supplierId", alias = "supplier_id")]
    pub supplier_ref: Option<String>,

    #[serde(alias = "user_ref", alias = "userId", alias = "user_id")]
    pub user_ref: Option<String>,

    #[serde(alias = "totalAmount", alias = "total_amount")]
    pub total: Option<Decimal>,
}

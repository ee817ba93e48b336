use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::canonical::ParamSet;
use crate::core::{AppError, Currency, Result};
use crate::modules::gateways::models::GatewayProvider;

/// Redirect-style payment gateway: signs outbound redirects and authenticates
/// the parameters the provider sends back. No network I/O happens here.
pub trait PaymentGateway: Send + Sync {
    /// Which provider this implementation speaks for
    fn provider(&self) -> GatewayProvider;

    /// Build the signed payment-initiation URL
    fn build_redirect(&self, request: &RedirectRequest) -> Result<RedirectResponse>;

    /// Authenticate a return/IPN parameter set and extract its outcome.
    ///
    /// Returns `SignatureMismatch` when the digest does not verify; nothing in
    /// `params` may be trusted in that case.
    fn verify_callback(&self, params: &ParamSet) -> Result<CallbackOutcome>;
}

/// Data needed to start a gateway payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectRequest {
    /// Order anchoring the payment
    pub order_id: String,

    /// Amount in the major unit (VND)
    pub amount: Decimal,

    /// Free-text description shown by the provider
    pub description: String,

    /// Customer IP as seen by this server
    pub client_ip: String,

    /// Creation instant; drives the transaction reference and timestamps
    pub created_at: DateTime<Utc>,
}

impl RedirectRequest {
    pub fn validate(&self) -> Result<()> {
        if self.order_id.trim().is_empty() {
            return Err(AppError::validation("Order ID is required"));
        }
        Currency::VND.validate_amount(self.amount)?;
        Ok(())
    }
}

/// Signed redirect handed back to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectResponse {
    pub payment_url: String,

    /// Our reference echoed back by the provider; idempotency key for the callback
    pub transaction_ref: String,

    /// Amount as sent to the provider, in its minor unit
    pub amount_minor: i64,

    pub expires_at: DateTime<Utc>,
}

/// Authenticated result of a provider callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackOutcome {
    pub transaction_ref: String,

    /// Amount the provider reports, converted back to the major unit
    pub amount: Decimal,

    /// True only for the provider's designated success code
    pub success: bool,

    pub response_code: String,

    /// Provider-side transaction number, when supplied
    pub provider_transaction_no: Option<String>,

    pub bank_code: Option<String>,

    /// Settlement time reported by the provider
    pub paid_at: Option<DateTime<Utc>>,
}

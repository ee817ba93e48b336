use chrono::Duration;

use super::callback_verifier::verify_signed_params;
use super::canonical::ParamSet;
use super::gateway_trait::{CallbackOutcome, PaymentGateway, RedirectRequest, RedirectResponse};
use super::redirect_builder::build_signed_url;
use crate::core::{AppError, Currency, GatewayClock, Result};
use crate::modules::gateways::models::{GatewayProvider, ProviderConfig};

pub const VERSION: &str = "2.1.0";
pub const COMMAND_PAY: &str = "pay";
pub const LOCALE: &str = "vn";
pub const ORDER_TYPE: &str = "other";
pub const SUCCESS_CODE: &str = "00";

pub const KEY_VERSION: &str = "vnp_Version";
pub const KEY_COMMAND: &str = "vnp_Command";
pub const KEY_TMN_CODE: &str = "vnp_TmnCode";
pub const KEY_LOCALE: &str = "vnp_Locale";
pub const KEY_CURR_CODE: &str = "vnp_CurrCode";
pub const KEY_TXN_REF: &str = "vnp_TxnRef";
pub const KEY_ORDER_INFO: &str = "vnp_OrderInfo";
pub const KEY_ORDER_TYPE: &str = "vnp_OrderType";
pub const KEY_AMOUNT: &str = "vnp_Amount";
pub const KEY_RETURN_URL: &str = "vnp_ReturnUrl";
pub const KEY_IP_ADDR: &str = "vnp_IpAddr";
pub const KEY_CREATE_DATE: &str = "vnp_CreateDate";
pub const KEY_EXPIRE_DATE: &str = "vnp_ExpireDate";
pub const KEY_RESPONSE_CODE: &str = "vnp_ResponseCode";
pub const KEY_TRANSACTION_STATUS: &str = "vnp_TransactionStatus";
pub const KEY_TRANSACTION_NO: &str = "vnp_TransactionNo";
pub const KEY_BANK_CODE: &str = "vnp_BankCode";
pub const KEY_PAY_DATE: &str = "vnp_PayDate";
pub const KEY_SECURE_HASH: &str = "vnp_SecureHash";
pub const KEY_SECURE_HASH_TYPE: &str = "vnp_SecureHashType";

/// Fields removed before a returned set is re-verified
pub const SIGNATURE_FIELDS: [&str; 2] = [KEY_SECURE_HASH, KEY_SECURE_HASH_TYPE];

const MAX_ORDER_INFO_LEN: usize = 255;

/// VNPay redirect protocol (version 2.1.0)
pub struct VnpayGateway {
    config: ProviderConfig,
}

impl VnpayGateway {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    /// Transaction reference for an order at a given instant.
    ///
    /// Unique per order per second, which is the granularity of `vnp_CreateDate`.
    pub fn transaction_ref(request: &RedirectRequest) -> String {
        format!(
            "{}-{}",
            request.order_id.trim(),
            GatewayClock::format(request.created_at)
        )
    }

    /// The unsigned parameter set for a redirect
    pub fn redirect_params(&self, request: &RedirectRequest) -> Result<ParamSet> {
        request.validate()?;

        let amount_minor = Currency::VND.to_minor_units(request.amount)?;
        let expires_at = request.created_at + Duration::minutes(self.config.expire_minutes);

        let description = if request.description.trim().is_empty() {
            format!("Thanh toan don hang {}", request.order_id.trim())
        } else {
            request
                .description
                .trim()
                .chars()
                .take(MAX_ORDER_INFO_LEN)
                .collect()
        };

        let client_ip = if request.client_ip.trim().is_empty() {
            "127.0.0.1"
        } else {
            request.client_ip.trim()
        };

        let mut params = ParamSet::new();
        params
            .insert(KEY_VERSION, VERSION)
            .insert(KEY_COMMAND, COMMAND_PAY)
            .insert(KEY_TMN_CODE, &self.config.merchant_code)
            .insert(KEY_LOCALE, LOCALE)
            .insert(KEY_CURR_CODE, Currency::VND)
            .insert(KEY_TXN_REF, Self::transaction_ref(request))
            .insert(KEY_ORDER_INFO, description)
            .insert(KEY_ORDER_TYPE, ORDER_TYPE)
            .insert(KEY_AMOUNT, amount_minor)
            .insert(KEY_RETURN_URL, &self.config.return_url)
            .insert(KEY_IP_ADDR, client_ip)
            .insert(KEY_CREATE_DATE, GatewayClock::format(request.created_at))
            .insert(KEY_EXPIRE_DATE, GatewayClock::format(expires_at));

        Ok(params)
    }
}

impl PaymentGateway for VnpayGateway {
    fn provider(&self) -> GatewayProvider {
        GatewayProvider::Vnpay
    }

    fn build_redirect(&self, request: &RedirectRequest) -> Result<RedirectResponse> {
        self.config.ensure_usable()?;

        let params = self.redirect_params(request)?;
        let payment_url = build_signed_url(
            &self.config.base_url,
            &params,
            &self.config.hash_secret,
            KEY_SECURE_HASH,
        )?;

        let amount_minor = Currency::VND.to_minor_units(request.amount)?;

        tracing::debug!(
            provider = "vnpay",
            order_id = %request.order_id,
            amount_minor = amount_minor,
            sandbox = self.config.is_sandbox(),
            "Built signed redirect"
        );

        Ok(RedirectResponse {
            payment_url,
            transaction_ref: Self::transaction_ref(request),
            amount_minor,
            expires_at: request.created_at + Duration::minutes(self.config.expire_minutes),
        })
    }

    fn verify_callback(&self, params: &ParamSet) -> Result<CallbackOutcome> {
        self.config.ensure_usable()?;

        let verified = verify_signed_params(params, &self.config.hash_secret, &SIGNATURE_FIELDS)?;

        let required = |key: &str| {
            verified
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| AppError::validation(format!("Callback is missing '{}'", key)))
        };

        let transaction_ref = required(KEY_TXN_REF)?;
        let response_code = required(KEY_RESPONSE_CODE)?;
        let amount_minor: i64 = required(KEY_AMOUNT)?
            .parse()
            .map_err(|_| AppError::validation("Callback amount is not an integer"))?;

        // Success needs the response code, and the transaction status when present
        let status_ok = verified
            .get(KEY_TRANSACTION_STATUS)
            .map_or(true, |status| status == SUCCESS_CODE);

        Ok(CallbackOutcome {
            transaction_ref,
            amount: Currency::VND.from_minor_units(amount_minor),
            success: response_code == SUCCESS_CODE && status_ok,
            response_code,
            provider_transaction_no: verified.get(KEY_TRANSACTION_NO).map(str::to_string),
            bank_code: verified.get(KEY_BANK_CODE).map(str::to_string),
            paid_at: verified.get(KEY_PAY_DATE).and_then(GatewayClock::parse),
        })
    }
}

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::reconciliation::ReconciliationEngine;
use crate::core::{AppError, Currency, Result, SettlementLock, SettlementLocks};
use crate::modules::bills::models::{Bill, BillStatus};
use crate::modules::bills::repositories::BillRepository;
use crate::modules::bills::services::BillService;
use crate::modules::gateways::models::GatewayProvider;
use crate::modules::gateways::services::{GatewayService, ParamSet, RedirectRequest};
use crate::modules::orders::services::OrderService;
use crate::modules::payments::models::{
    CreatePaymentRequest, Payment, PaymentMethod, PaymentStatus, UpdatePaymentRequest,
};
use crate::modules::payments::repositories::PaymentRepository;

/// Note written on gateway payments reaped by the sweeper
pub const EXPIRED_NOTE: &str = "expired: no gateway callback";

/// Start of a gateway payment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default, alias = "bill_id")]
    pub bill_id: Option<String>,

    #[serde(default, alias = "order_id")]
    pub order_id: Option<String>,

    /// Defaults to the bill balance, or the order total when no bill is given
    #[serde(default)]
    pub amount: Option<Decimal>,

    #[serde(default, alias = "orderInfo")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub payment_id: String,
    pub payment_url: String,
    pub transaction_ref: String,
    pub amount: Decimal,
    pub expires_at: DateTime<Utc>,
}

/// Result of applying a verified gateway return
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum ReturnOutcome {
    /// The pending payment moved to completed or failed
    Applied { payment: Payment },

    /// The payment had already left pending; nothing changed
    Duplicate { payment: Payment },
}

impl ReturnOutcome {
    pub fn payment(&self) -> &Payment {
        match self {
            ReturnOutcome::Applied { payment } | ReturnOutcome::Duplicate { payment } => payment,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, ReturnOutcome::Duplicate { .. })
    }
}

/// Payment writes. Every write runs under the settlement lock of the bill it
/// affects. A payment without a bill also holds its order's key and the keys
/// of any live bill covering that order.
pub struct PaymentService {
    payment_repo: Arc<dyn PaymentRepository>,
    bill_repo: Arc<dyn BillRepository>,
    bill_service: Arc<BillService>,
    order_service: Arc<OrderService>,
    reconciliation: Arc<ReconciliationEngine>,
    gateways: Arc<GatewayService>,
    locks: Arc<SettlementLocks>,
}

impl PaymentService {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepository>,
        bill_repo: Arc<dyn BillRepository>,
        bill_service: Arc<BillService>,
        order_service: Arc<OrderService>,
        reconciliation: Arc<ReconciliationEngine>,
        gateways: Arc<GatewayService>,
        locks: Arc<SettlementLocks>,
    ) -> Self {
        Self {
            payment_repo,
            bill_repo,
            bill_service,
            order_service,
            reconciliation,
            gateways,
            locks,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Payment> {
        self.payment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", id)))
    }

    /// Payments of a bill (including legacy order rows) or of an order
    pub async fn list(&self, bill_id: Option<&str>, order_id: Option<&str>) -> Result<Vec<Payment>> {
        match (bill_id, order_id) {
            (Some(bill_id), _) => {
                let bill = self.load_bill(bill_id).await?;
                self.reconciliation.payments_for_bill(&bill).await
            }
            (None, Some(order_id)) => self.payment_repo.find_by_order_id(order_id).await,
            (None, None) => Err(AppError::validation("billId or orderId is required")),
        }
    }

    /// Admin-recorded payment. Cash settles immediately; other manual methods
    /// wait for confirmation. Gateway methods go through checkout instead.
    pub async fn record_manual(&self, request: CreatePaymentRequest) -> Result<Payment> {
        if request.method.is_gateway() {
            return Err(AppError::validation(format!(
                "{} payments must be started through gateway checkout",
                request.method
            )));
        }

        let order_id = non_empty(request.order_id);
        let bill_id = self.target_bill(non_empty(request.bill_id), order_id.as_deref()).await?;

        let payment = match bill_id {
            Some(bill_id) => {
                let _lock = self.locks.lock_bill(&bill_id).await;

                let bill = self.load_bill(&bill_id).await?;
                ensure_bill_open(&bill)?;
                let order_id = resolve_bill_order(&bill, order_id)?;

                let payment = Payment::manual(
                    Some(bill.id.clone()),
                    order_id,
                    request.amount,
                    request.method,
                    request.notes,
                )?;
                let payment = self.payment_repo.create(&payment).await?;
                self.bill_service.promote_if_settled(&bill.id).await?;
                payment
            }
            None => {
                let order_id =
                    order_id.ok_or_else(|| AppError::validation("billId or orderId is required"))?;
                let _locks = self.lock_unbilled_order(&order_id).await?;

                let order = self.order_service.get(&order_id).await?;
                let payment =
                    Payment::manual(None, order.id, request.amount, request.method, request.notes)?;
                self.payment_repo.create(&payment).await?
            }
        };

        info!(
            payment_id = %payment.id,
            bill_id = ?payment.bill_id,
            order_id = %payment.order_id,
            method = %payment.method,
            status = %payment.status,
            amount = %payment.amount,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Admin edit: confirm, fail or refund, and notes
    pub async fn update(&self, id: &str, request: UpdatePaymentRequest) -> Result<Payment> {
        let existing = self.get(id).await?;
        let _locks = self.lock_payment(&existing).await?;

        let mut payment = self.get(id).await?;

        if let Some(next) = request.status {
            if next != payment.status {
                if next == PaymentStatus::Completed && payment.method.is_gateway() {
                    return Err(AppError::validation(
                        "Gateway payments complete only through a verified gateway callback",
                    ));
                }
                payment.transition(next, Utc::now())?;
            }
        }
        if request.notes.is_some() {
            payment.notes = request.notes;
            payment.updated_at = Utc::now();
        }

        self.payment_repo.update(&payment).await?;
        self.promote_affected(&payment).await?;

        info!(payment_id = %payment.id, status = %payment.status, "Payment updated");
        Ok(payment)
    }

    /// Build a signed redirect and record the pending gateway payment.
    ///
    /// Given only a bill, the payment is anchored to a synthetic
    /// `gateway_payment` order.
    pub async fn initiate_gateway_checkout(
        &self,
        provider: GatewayProvider,
        request: CheckoutRequest,
        client_ip: &str,
    ) -> Result<CheckoutResponse> {
        // Reject unusable providers before anything is written
        self.gateways.get_gateway(provider)?;

        let description = request.description.unwrap_or_default();
        let order_id = non_empty(request.order_id);
        let bill_id = self.target_bill(non_empty(request.bill_id), order_id.as_deref()).await?;

        match bill_id {
            Some(bill_id) => {
                let _lock = self.locks.lock_bill(&bill_id).await;

                let bill = self.load_bill(&bill_id).await?;
                ensure_bill_open(&bill)?;

                let settlement = self.reconciliation.settle(&bill).await?;
                let amount = request.amount.unwrap_or(settlement.balance);
                Currency::VND.validate_amount(amount)?;
                if amount > settlement.balance {
                    return Err(AppError::validation(format!(
                        "Amount {} exceeds the outstanding balance {}",
                        amount, settlement.balance
                    )));
                }

                let order_id = match order_id {
                    Some(order_id) => {
                        if !bill.covers_order(&order_id) {
                            return Err(AppError::validation(format!(
                                "Order '{}' is not part of bill '{}'",
                                order_id, bill.id
                            )));
                        }
                        order_id
                    }
                    None => self.order_service.create_gateway_anchor(amount).await?.id,
                };

                self.start_gateway_payment(
                    provider,
                    Some(bill.id),
                    order_id,
                    amount,
                    description,
                    client_ip,
                )
                .await
            }
            None => {
                let order_id =
                    order_id.ok_or_else(|| AppError::validation("billId or orderId is required"))?;
                let _locks = self.lock_unbilled_order(&order_id).await?;

                let order = self.order_service.get(&order_id).await?;
                if self
                    .reconciliation
                    .compute_order_settlement(&order.id)
                    .await?
                    .is_fully_paid
                {
                    return Err(AppError::settlement_violation(format!("order '{}'", order.id)));
                }

                let amount = request.amount.unwrap_or(order.total);
                Currency::VND.validate_amount(amount)?;

                self.start_gateway_payment(provider, None, order.id, amount, description, client_ip)
                    .await
            }
        }
    }

    async fn start_gateway_payment(
        &self,
        provider: GatewayProvider,
        bill_id: Option<String>,
        order_id: String,
        amount: Decimal,
        description: String,
        client_ip: &str,
    ) -> Result<CheckoutResponse> {
        let redirect_request = RedirectRequest {
            order_id,
            amount,
            description,
            client_ip: client_ip.to_string(),
            created_at: Utc::now(),
        };
        redirect_request.validate()?;

        let redirect = self.gateways.build_redirect(provider, &redirect_request)?;

        let payment = Payment::gateway_pending(
            bill_id,
            redirect_request.order_id,
            amount,
            provider,
            redirect.transaction_ref.clone(),
        )?;
        let payment = self.payment_repo.create(&payment).await?;

        info!(
            payment_id = %payment.id,
            provider = %provider,
            txn_ref = %redirect.transaction_ref,
            amount = %amount,
            "Gateway payment pending"
        );

        Ok(CheckoutResponse {
            payment_id: payment.id,
            payment_url: redirect.payment_url,
            transaction_ref: redirect.transaction_ref,
            amount,
            expires_at: redirect.expires_at,
        })
    }

    /// Verify a provider return and apply it exactly once.
    ///
    /// A bad signature aborts before any lookup. Only a pending payment
    /// transitions; a repeated delivery reports `Duplicate`.
    pub async fn handle_gateway_return(
        &self,
        provider: GatewayProvider,
        params: &ParamSet,
    ) -> Result<ReturnOutcome> {
        let outcome = self.gateways.verify_callback(provider, params)?;

        let existing = self
            .payment_repo
            .find_by_transaction_id(&outcome.transaction_ref)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Payment for transaction '{}' not found",
                    outcome.transaction_ref
                ))
            })?;

        if existing.method != PaymentMethod::from(provider) {
            return Err(AppError::validation(format!(
                "Transaction '{}' was not started with {}",
                outcome.transaction_ref, provider
            )));
        }

        let _locks = self.lock_payment(&existing).await?;

        let mut payment = self.get(&existing.id).await?;

        if payment.status != PaymentStatus::Pending {
            info!(
                payment_id = %payment.id,
                txn_ref = %outcome.transaction_ref,
                status = %payment.status,
                "Duplicate gateway return ignored"
            );
            return Ok(ReturnOutcome::Duplicate { payment });
        }

        if outcome.amount != payment.amount {
            warn!(
                payment_id = %payment.id,
                txn_ref = %outcome.transaction_ref,
                expected = %payment.amount,
                reported = %outcome.amount,
                "Gateway return amount mismatch"
            );
            return Err(AppError::validation(
                "Gateway amount does not match the pending payment",
            ));
        }

        let now = Utc::now();
        if outcome.success {
            payment.transition(PaymentStatus::Completed, outcome.paid_at.unwrap_or(now))?;
            if let Some(transaction_no) = &outcome.provider_transaction_no {
                payment.notes = Some(format!("{} transaction {}", provider, transaction_no));
            }
        } else {
            payment.transition(PaymentStatus::Failed, now)?;
            payment.notes = Some(format!("{} response code {}", provider, outcome.response_code));
        }

        self.payment_repo.update(&payment).await?;
        self.promote_affected(&payment).await?;

        info!(
            payment_id = %payment.id,
            txn_ref = %outcome.transaction_ref,
            response_code = %outcome.response_code,
            status = %payment.status,
            "Gateway return applied"
        );

        Ok(ReturnOutcome::Applied { payment })
    }

    /// Fail gateway payments that stayed pending longer than `ttl`
    pub async fn expire_stale(&self, ttl: Duration) -> Result<usize> {
        let before = Utc::now() - ttl;
        let stale = self.payment_repo.find_stale_pending(before).await?;

        let mut expired = 0;
        for candidate in stale {
            let _locks = self.lock_payment(&candidate).await?;

            // A callback may have landed while waiting for the lock
            let mut payment = self.get(&candidate.id).await?;
            if payment.status != PaymentStatus::Pending {
                continue;
            }

            payment.transition(PaymentStatus::Failed, Utc::now())?;
            payment.notes = Some(EXPIRED_NOTE.to_string());
            self.payment_repo.update(&payment).await?;

            info!(
                payment_id = %payment.id,
                txn_ref = ?payment.transaction_id,
                "Expired stale gateway payment"
            );
            expired += 1;
        }

        Ok(expired)
    }

    /// Bill a new payment is recorded against: the one given, else the live
    /// bill covering the named order
    async fn target_bill(
        &self,
        bill_id: Option<String>,
        order_id: Option<&str>,
    ) -> Result<Option<String>> {
        match (bill_id, order_id) {
            (Some(bill_id), _) => Ok(Some(bill_id)),
            (None, Some(order_id)) => self.reconciliation.bill_for_order(order_id).await,
            (None, None) => Err(AppError::validation("billId or orderId is required")),
        }
    }

    /// Locks for a payment on an order that has no live bill
    async fn lock_unbilled_order(&self, order_id: &str) -> Result<Vec<SettlementLock>> {
        let (locks, bill_ids) = self.order_service.lock_for_write(order_id).await?;
        if !bill_ids.is_empty() {
            return Err(AppError::Conflict(format!(
                "Order '{}' was billed while the payment was being recorded",
                order_id
            )));
        }
        Ok(locks)
    }

    /// Locks covering everything an existing payment counts toward
    async fn lock_payment(&self, payment: &Payment) -> Result<Vec<SettlementLock>> {
        match &payment.bill_id {
            Some(bill_id) => Ok(vec![self.locks.lock_bill(bill_id).await]),
            None => Ok(self.order_service.lock_for_write(&payment.order_id).await?.0),
        }
    }

    /// Promote the bills a written payment counts toward; caller holds `lock_payment`
    async fn promote_affected(&self, payment: &Payment) -> Result<()> {
        match &payment.bill_id {
            Some(bill_id) => {
                self.bill_service.promote_if_settled(bill_id).await?;
            }
            None => {
                for bill in self
                    .reconciliation
                    .open_bills_for_order(&payment.order_id)
                    .await?
                {
                    self.bill_service.promote_if_settled(&bill.id).await?;
                }
            }
        }
        Ok(())
    }

    async fn load_bill(&self, bill_id: &str) -> Result<Bill> {
        self.bill_repo
            .find_by_id(bill_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Bill '{}' not found", bill_id)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// New payments are accepted only on pending bills
fn ensure_bill_open(bill: &Bill) -> Result<()> {
    match bill.status {
        BillStatus::Pending => Ok(()),
        BillStatus::Paid => Err(AppError::settlement_violation(format!("bill '{}'", bill.id))),
        BillStatus::Cancelled => Err(AppError::validation(format!(
            "Bill '{}' is cancelled",
            bill.id
        ))),
    }
}

/// Order a bill payment is recorded against: the one named, or the bill's first
fn resolve_bill_order(bill: &Bill, order_id: Option<String>) -> Result<String> {
    match order_id {
        Some(order_id) if bill.covers_order(&order_id) => Ok(order_id),
        Some(order_id) => Err(AppError::validation(format!(
            "Order '{}' is not part of bill '{}'",
            order_id, bill.id
        ))),
        None => bill
            .order_ids
            .first()
            .cloned()
            .ok_or_else(|| AppError::validation(format!("Bill '{}' has no orders", bill.id))),
    }
}

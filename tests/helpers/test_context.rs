// Service graph wired the way main.rs wires it, over a MemoryStore

use std::sync::Arc;

use actix_web::web;
use rust_decimal::Decimal;

use settlepay::config::GatewaysConfig;
use settlepay::core::SettlementLocks;
use settlepay::modules::bills::{self, Bill, BillRepository, BillService};
use settlepay::modules::gateways::services::vnpay::{
    KEY_AMOUNT, KEY_BANK_CODE, KEY_PAY_DATE, KEY_RESPONSE_CODE, KEY_SECURE_HASH,
    KEY_SECURE_HASH_TYPE, KEY_TMN_CODE, KEY_TRANSACTION_NO, KEY_TRANSACTION_STATUS, KEY_TXN_REF,
};
use settlepay::modules::gateways::services::{encode_component, signature};
use settlepay::modules::gateways::{
    self, GatewayEnvironment, GatewayProvider, GatewayService, ParamSet, ProviderConfig,
};
use settlepay::modules::orders::{self, Order, OrderRepository, OrderService, OrderType};
use settlepay::modules::payments::{
    self, Payment, PaymentMethod, PaymentService, PaymentStatus, ReconciliationEngine,
    SettlementGuard,
};

use super::memory_store::MemoryStore;

pub const TEST_SECRET: &str = "SANDBOXSECRET";
pub const TEST_TMN_CODE: &str = "TMN01";

pub fn vnpay_config() -> ProviderConfig {
    ProviderConfig {
        provider: GatewayProvider::Vnpay,
        enabled: true,
        environment: GatewayEnvironment::Sandbox,
        hash_secret: TEST_SECRET.to_string(),
        merchant_code: TEST_TMN_CODE.to_string(),
        return_url: "https://shop.test/payments/gateway/vnpay/return".to_string(),
        base_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
        expire_minutes: 15,
    }
}

pub fn gateways_config() -> GatewaysConfig {
    GatewaysConfig {
        vnpay: vnpay_config(),
        momo: ProviderConfig::disabled(GatewayProvider::Momo),
        zalopay: ProviderConfig::disabled(GatewayProvider::Zalopay),
    }
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub locks: Arc<SettlementLocks>,
    pub gateways: Arc<GatewayService>,
    pub reconciliation: Arc<ReconciliationEngine>,
    pub guard: Arc<SettlementGuard>,
    pub orders: Arc<OrderService>,
    pub bills: Arc<BillService>,
    pub payments: Arc<PaymentService>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_gateways(&gateways_config())
    }

    pub fn with_gateways(config: &GatewaysConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(SettlementLocks::new());
        let gateways = Arc::new(GatewayService::from_config(config));

        let reconciliation = Arc::new(ReconciliationEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let guard = Arc::new(SettlementGuard::new(reconciliation.clone()));
        let orders = Arc::new(OrderService::new(
            store.clone(),
            reconciliation.clone(),
            guard.clone(),
            locks.clone(),
        ));
        let bills = Arc::new(BillService::new(
            store.clone(),
            store.clone(),
            reconciliation.clone(),
            guard.clone(),
            locks.clone(),
        ));
        let payments = Arc::new(PaymentService::new(
            store.clone(),
            store.clone(),
            bills.clone(),
            orders.clone(),
            reconciliation.clone(),
            gateways.clone(),
            locks.clone(),
        ));

        Self {
            store,
            locks,
            gateways,
            reconciliation,
            guard,
            orders,
            bills,
            payments,
        }
    }

    pub async fn seed_order(&self, order_type: OrderType, total: i64) -> Order {
        let order = Order::new(order_type, Decimal::new(total, 0)).unwrap();
        OrderRepository::create(self.store.as_ref(), &order)
            .await
            .unwrap()
    }

    pub async fn seed_bill(&self, order_ids: &[&str], total: i64) -> Bill {
        let bill = Bill::new(
            order_ids.iter().map(|id| id.to_string()).collect(),
            Decimal::new(total, 0),
            None,
        )
        .unwrap();
        BillRepository::create(self.store.as_ref(), &bill)
            .await
            .unwrap()
    }

    /// Insert a payment row directly with the given status
    pub fn seed_payment(
        &self,
        bill_id: Option<&str>,
        order_id: &str,
        amount: i64,
        method: PaymentMethod,
        status: PaymentStatus,
    ) -> Payment {
        let mut payment = Payment::cash(
            bill_id.map(str::to_string),
            order_id.to_string(),
            Decimal::new(amount, 0),
            None,
        )
        .unwrap();
        payment.method = method;
        payment.status = status;
        if status != PaymentStatus::Completed {
            payment.payment_date = None;
        }
        self.store.put_payment(payment.clone());
        payment
    }

    /// Register services and routes the way main.rs does
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.gateways.clone()))
            .app_data(web::Data::new(self.orders.clone()))
            .app_data(web::Data::new(self.bills.clone()))
            .app_data(web::Data::new(self.payments.clone()));
        gateways::configure(cfg);
        orders::configure(cfg);
        bills::configure(cfg);
        payments::configure(cfg);
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// VNPay return parameters signed with the test secret
pub fn signed_vnpay_return(txn_ref: &str, amount_minor: i64, response_code: &str) -> ParamSet {
    let amount = amount_minor.to_string();
    let mut params: ParamSet = [
        (KEY_TXN_REF, txn_ref),
        (KEY_AMOUNT, amount.as_str()),
        (KEY_RESPONSE_CODE, response_code),
        (KEY_TRANSACTION_STATUS, response_code),
        (KEY_TRANSACTION_NO, "14123456"),
        (KEY_BANK_CODE, "NCB"),
        (KEY_PAY_DATE, "20251101101000"),
        (KEY_TMN_CODE, TEST_TMN_CODE),
    ]
    .into_iter()
    .collect();

    let digest = signature::sign(&params.canonical_string(), TEST_SECRET).unwrap();
    params
        .insert(KEY_SECURE_HASH, digest)
        .insert(KEY_SECURE_HASH_TYPE, "HmacSHA512");
    params
}

/// Query string for a parameter set, as a provider would redirect with
pub fn query_string(params: &ParamSet) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub mod payment_service;
pub mod pending_sweeper;
pub mod reconciliation;
pub mod settlement_guard;

pub use payment_service::{CheckoutRequest, CheckoutResponse, PaymentService, ReturnOutcome};
pub use pending_sweeper::PendingPaymentSweeper;
pub use reconciliation::{is_fully_paid, ReconciliationEngine, Settlement};
pub use settlement_guard::SettlementGuard;

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{Payment, PaymentMethod, PaymentStatus};
pub use repositories::{MySqlPaymentRepository, PaymentRepository};
pub use services::{
    PaymentService, PendingPaymentSweeper, ReconciliationEngine, Settlement, SettlementGuard,
};

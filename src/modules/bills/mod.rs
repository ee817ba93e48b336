pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{Bill, BillStatus};
pub use repositories::{BillRepository, MySqlBillRepository};
pub use services::BillService;

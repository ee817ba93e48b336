pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{Order, OrderPayload, OrderType};
pub use repositories::{MySqlOrderRepository, OrderRepository};
pub use services::OrderService;

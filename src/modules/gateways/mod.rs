pub mod controllers;
pub mod models;
pub mod services;

pub use controllers::configure;
pub use models::{GatewayEnvironment, GatewayProvider, ProviderConfig};
pub use services::{GatewayInfo, GatewayService, ParamSet, PaymentGateway, VnpayGateway};

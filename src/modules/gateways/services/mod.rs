pub mod callback_verifier;
pub mod canonical;
pub mod gateway_service;
pub mod gateway_trait;
pub mod redirect_builder;
pub mod signature;
pub mod vnpay;

pub use callback_verifier::verify_signed_params;
pub use canonical::{encode_component, ParamSet};
pub use gateway_service::{GatewayInfo, GatewayService};
pub use gateway_trait::{CallbackOutcome, PaymentGateway, RedirectRequest, RedirectResponse};
pub use redirect_builder::build_signed_url;
pub use vnpay::VnpayGateway;

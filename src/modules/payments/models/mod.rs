pub mod payment;

pub use payment::{
    CreatePaymentRequest, Payment, PaymentMethod, PaymentStatus, UpdatePaymentRequest,
};

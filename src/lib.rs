//! Settlepay: bill settlement and gateway payment signing
//!
//! Orders are billed, bills are paid by cash or by redirect gateways (VNPay),
//! and settled bills and orders are protected from further edits.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::bills;
pub use modules::gateways;
pub use modules::orders;
pub use modules::payments;

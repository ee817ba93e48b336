pub mod currency;
pub mod error;
pub mod locks;
pub mod response;
pub mod timezone;

pub use currency::Currency;
pub use error::{AppError, Result};
pub use locks::{SettlementLock, SettlementLocks};
pub use response::ApiResponse;
pub use timezone::GatewayClock;

pub mod bills;
pub mod gateways;
pub mod health;
pub mod orders;
pub mod payments;

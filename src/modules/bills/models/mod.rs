pub mod bill;

pub use bill::{Bill, BillPayload, BillStatus, CreateBillRequest};

//! Payments module - the charge port used by donation intake.

mod payments_model;
mod payments_traits;
mod precaptured_gateway;

pub use payments_model::{ChargeReceipt, ChargeRequest};
pub use payments_traits::PaymentGateway;
pub use precaptured_gateway::PrecapturedPaymentGateway;

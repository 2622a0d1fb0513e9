use async_trait::async_trait;

use crate::errors::Result;
use crate::payments::payments_model::{ChargeReceipt, ChargeRequest};

/// Captures donor payments.
///
/// A returned receipt means the money has been captured; donation intake
/// stores the donation only after this succeeds.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, charge: ChargeRequest) -> Result<ChargeReceipt>;
}

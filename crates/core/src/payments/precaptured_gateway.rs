use async_trait::async_trait;
use log::debug;

use crate::errors::{Error, Result};
use crate::payments::payments_model::{ChargeReceipt, ChargeRequest};
use crate::payments::payments_traits::PaymentGateway;

/// Gateway for charges the donor's client already settled with the processor.
///
/// The `source` token is the processor's transaction reference and becomes
/// the donation's transaction id.
#[derive(Clone, Default)]
pub struct PrecapturedPaymentGateway;

#[async_trait]
impl PaymentGateway for PrecapturedPaymentGateway {
    async fn charge(&self, charge: ChargeRequest) -> Result<ChargeReceipt> {
        let reference = charge.source.trim();
        if reference.is_empty() {
            return Err(Error::Payment("missing payment reference".to_string()));
        }
        if charge.amount <= 0 {
            return Err(Error::Payment(format!(
                "refusing to record a charge of {} {}",
                charge.amount, charge.currency
            )));
        }
        debug!(
            "Accepting pre-captured charge {} for {} {}",
            reference, charge.amount, charge.currency
        );
        Ok(ChargeReceipt {
            transaction_id: reference.to_string(),
        })
    }
}

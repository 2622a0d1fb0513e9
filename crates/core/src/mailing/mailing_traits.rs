use async_trait::async_trait;
use serde_json::Value;

use super::mailing_errors::MailerError;
use super::mailing_model::BulkDestination;

/// An external service that sends one templated email per destination.
///
/// One call is one batch; callers keep batches at or below
/// [`BULK_EMAIL_BATCH_SIZE`](crate::constants::BULK_EMAIL_BATCH_SIZE).
#[async_trait]
pub trait BulkEmailClient: Send + Sync {
    async fn send_batch(
        &self,
        destinations: &[BulkDestination],
        template: &str,
        default_data: &Value,
    ) -> Result<(), MailerError>;
}

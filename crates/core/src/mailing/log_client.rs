use async_trait::async_trait;
use log::info;
use serde_json::Value;

use super::mailing_errors::MailerError;
use super::mailing_model::BulkDestination;
use super::mailing_traits::BulkEmailClient;

/// Mail client for deployments without a mail gateway: logs and succeeds.
#[derive(Clone, Default)]
pub struct LogOnlyEmailClient;

#[async_trait]
impl BulkEmailClient for LogOnlyEmailClient {
    async fn send_batch(
        &self,
        destinations: &[BulkDestination],
        template: &str,
        _default_data: &Value,
    ) -> Result<(), MailerError> {
        let recipients: Vec<&str> = destinations.iter().map(|d| d.to_address.as_str()).collect();
        info!(
            "[mail disabled] would send '{}' to {} recipient(s): {}",
            template,
            recipients.len(),
            recipients.join(", ")
        );
        Ok(())
    }
}

//! HTTP mail gateway client.
//!
//! Posts each batch as one JSON document:
//!
//! ```json
//! {
//!   "source": "noreply@example.org",
//!   "template": "winning-template",
//!   "defaultTemplateData": { ... },
//!   "destinations": [
//!     { "toAddresses": ["donor@example.org"], "replacementTemplateData": { ... } }
//!   ]
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::mailing_errors::MailerError;
use super::mailing_model::BulkDestination;
use super::mailing_traits::BulkEmailClient;
use crate::errors::{Error, Result};

#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Sender address shown to recipients.
    pub source: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkTemplatedEmail<'a> {
    source: &'a str,
    template: &'a str,
    default_template_data: &'a Value,
    destinations: Vec<Destination<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Destination<'a> {
    to_addresses: [&'a str; 1],
    replacement_template_data: &'a Value,
}

pub struct HttpBulkEmailClient {
    client: Client,
    config: HttpMailerConfig,
}

impl HttpBulkEmailClient {
    pub fn new(config: HttpMailerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfigValue(format!("mail client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl BulkEmailClient for HttpBulkEmailClient {
    async fn send_batch(
        &self,
        destinations: &[BulkDestination],
        template: &str,
        default_data: &Value,
    ) -> std::result::Result<(), MailerError> {
        let body = BulkTemplatedEmail {
            source: &self.config.source,
            template,
            default_template_data: default_data,
            destinations: destinations
                .iter()
                .map(|d| Destination {
                    to_addresses: [d.to_address.as_str()],
                    replacement_template_data: &d.template_data,
                })
                .collect(),
        };
        let payload =
            serde_json::to_vec(&body).map_err(|e| MailerError::Serialization(e.to_string()))?;

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(
            "Mail gateway accepted '{}' for {} destination(s)",
            template,
            destinations.len()
        );
        Ok(())
    }
}

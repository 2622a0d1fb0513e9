use futures::future::join_all;
use log::{debug, warn};
use serde_json::Value;

use super::mailing_errors::{BatchFailure, BulkSendError};
use super::mailing_model::{BulkDestination, BulkSendSummary};
use super::mailing_traits::BulkEmailClient;
use crate::constants::BULK_EMAIL_BATCH_SIZE;

/// Sends `template` to every destination, `BULK_EMAIL_BATCH_SIZE` per call.
///
/// All batches are issued concurrently and awaited together. The call succeeds
/// only when every batch succeeded; otherwise the error lists each failed
/// batch. Batches that did succeed are not retracted.
pub async fn send_bulk_templated_email(
    client: &dyn BulkEmailClient,
    destinations: &[BulkDestination],
    template: &str,
    default_data: &Value,
) -> Result<BulkSendSummary, BulkSendError> {
    let batches: Vec<&[BulkDestination]> = destinations.chunks(BULK_EMAIL_BATCH_SIZE).collect();
    let total_batches = batches.len();
    debug!(
        "Sending '{}' to {} recipient(s) in {} batch(es)",
        template,
        destinations.len(),
        total_batches
    );

    let results = join_all(batches.into_iter().enumerate().map(|(index, batch)| async move {
        let outcome = client.send_batch(batch, template, default_data).await;
        (index, batch.len(), outcome)
    }))
    .await;

    let failures: Vec<BatchFailure> = results
        .into_iter()
        .filter_map(|(batch_index, recipients, outcome)| {
            outcome.err().map(|error| {
                warn!(
                    "Batch {} of '{}' ({} recipient(s)) failed: {}",
                    batch_index, template, recipients, error
                );
                BatchFailure {
                    batch_index,
                    recipients,
                    error,
                }
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(BulkSendSummary {
            batches: total_batches,
            recipients: destinations.len(),
        })
    } else {
        Err(BulkSendError {
            total_batches,
            total_recipients: destinations.len(),
            failures,
        })
    }
}

use std::fmt;

use thiserror::Error;

/// Failure of a single external bulk-send call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MailerError {
    #[error("mail gateway unreachable: {0}")]
    Transport(String),

    #[error("mail gateway answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not encode template data: {0}")]
    Serialization(String),

    #[error("mail gateway rejected the batch: {0}")]
    Rejected(String),
}

/// A batch whose external call failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub batch_index: usize,
    pub recipients: usize,
    pub error: MailerError,
}

/// Aggregate failure of a bulk send: some batches may have gone out.
///
/// Re-sending the whole job is safe but may notify some recipients twice.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct BulkSendError {
    pub total_batches: usize,
    pub total_recipients: usize,
    pub failures: Vec<BatchFailure>,
}

impl BulkSendError {
    pub fn failed_batches(&self) -> usize {
        self.failures.len()
    }

    pub fn failed_recipients(&self) -> usize {
        self.failures.iter().map(|f| f.recipients).sum()
    }
}

impl fmt::Display for BulkSendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} batches failed, {} of {} recipients not confirmed",
            self.failed_batches(),
            self.total_batches,
            self.failed_recipients(),
            self.total_recipients
        )?;
        if let Some(first) = self.failures.first() {
            write!(f, " (batch {}: {})", first.batch_index, first.error)?;
        }
        Ok(())
    }
}

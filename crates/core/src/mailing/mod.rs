//! Mailing module - bulk templated email dispatch.
//!
//! `send_bulk_templated_email` splits recipients into batches of
//! [`BULK_EMAIL_BATCH_SIZE`](crate::constants::BULK_EMAIL_BATCH_SIZE), sends
//! every batch concurrently through a [`BulkEmailClient`] and reports any
//! failed batches as one aggregate error.

mod bulk_sender;
mod http_client;
mod log_client;
mod mailing_errors;
mod mailing_model;
mod mailing_traits;

pub use bulk_sender::send_bulk_templated_email;
pub use http_client::{HttpBulkEmailClient, HttpMailerConfig};
pub use log_client::LogOnlyEmailClient;
pub use mailing_errors::{BatchFailure, BulkSendError, MailerError};
pub use mailing_model::{BulkDestination, BulkSendSummary};
pub use mailing_traits::BulkEmailClient;

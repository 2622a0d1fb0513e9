use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recipient of a bulk templated email and its substitution data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkDestination {
    pub to_address: String,
    pub template_data: Value,
}

impl BulkDestination {
    pub fn new(to_address: impl Into<String>, template_data: Value) -> Self {
        Self {
            to_address: to_address.into(),
            template_data,
        }
    }
}

/// Outcome of a fully successful bulk send.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkSendSummary {
    pub batches: usize,
    pub recipients: usize,
}

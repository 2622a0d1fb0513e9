use serde::{Deserialize, Serialize};

/// A charge to capture before a donation is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// Payment source token issued to the donor's client.
    pub source: String,
    pub currency: String,
}

/// Proof of a settled charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChargeReceipt {
    pub transaction_id: String,
}

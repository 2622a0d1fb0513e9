use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::DonationEvent;

/// Identifies one live relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A message on the relay channel.
///
/// Serialized as `{"event": "<name>", "data": {"gameId": ..., "orgId": ...}}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum RelayMessage {
    /// Inbound: a client reports that a donation happened.
    #[serde(rename = "donationOccur")]
    DonationOccur(DonationEvent),
    /// Outbound: something changed, refetch.
    #[serde(rename = "updateAvailable")]
    UpdateAvailable(DonationEvent),
}

impl RelayMessage {
    pub fn event(&self) -> &DonationEvent {
        match self {
            RelayMessage::DonationOccur(event) | RelayMessage::UpdateAvailable(event) => event,
        }
    }
}

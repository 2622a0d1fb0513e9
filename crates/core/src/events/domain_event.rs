//! Domain event types.

use serde::{Deserialize, Serialize};

/// Emitted after a donation has been durably stored.
///
/// Carries only identifiers; subscribers use it as a cue to refetch.
/// Serialized as `{ "gameId": "<id>", "orgId": "<id>" }`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DonationEvent {
    #[serde(rename = "gameId")]
    pub game_id: Option<String>,
    #[serde(rename = "orgId")]
    pub org_id: String,
}

impl DonationEvent {
    pub fn new(game_id: Option<String>, org_id: impl Into<String>) -> Self {
        Self {
            game_id,
            org_id: org_id.into(),
        }
    }
}

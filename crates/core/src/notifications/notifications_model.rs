//! Winner notification models.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::constants::{WINNER_NEEDS_LOCATION_TEMPLATE, WINNER_TEMPLATE};
use crate::donations::Donation;
use crate::games::Game;
use crate::users::User;

/// Which winner email a donor receives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum WinnerCohort {
    /// Mailing address on file.
    Ready,
    /// At least one of address, city, state or zip is missing.
    NeedsLocation,
}

impl fmt::Display for WinnerCohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinnerCohort::Ready => write!(f, "ready"),
            WinnerCohort::NeedsLocation => write!(f, "needs-location"),
        }
    }
}

/// A winning donation joined with its donor. Computed, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub donation: Donation,
    pub user: User,
}

impl Winner {
    pub fn cohort(&self) -> WinnerCohort {
        if self.user.has_complete_location() {
            WinnerCohort::Ready
        } else {
            WinnerCohort::NeedsLocation
        }
    }

    /// Per-recipient substitution data for the winner templates.
    pub fn template_data(&self, game: &Game) -> Value {
        let location = self.user.location.clone().unwrap_or_default();
        json!({
            "name": self.user.name,
            "email": self.user.email,
            "phone": self.user.phone.clone().unwrap_or_default(),
            "location": {
                "address": location.address.unwrap_or_default(),
                "city": location.city.unwrap_or_default(),
                "state": location.state.unwrap_or_default(),
                "zip": location.zip.unwrap_or_default(),
            },
            "donationId": self.donation.id,
            "amount": self.donation.amount,
            "tiles": self.donation.tiles,
            "date": self.donation.date.to_rfc3339(),
            "organizationId": self.donation.organization_id,
            "gameId": game.id,
            "gameName": game.name,
            "winningTile": game.winning_tile,
        })
    }
}

/// Fallback values the mail service substitutes for missing fields.
pub fn default_template_data() -> Value {
    json!({
        "name": "name",
        "email": "email",
        "phone": "phone",
        "location": {
            "address": "address",
            "city": "city",
            "state": "state",
            "zip": "zip",
        },
        "donationId": "",
        "amount": 0,
        "tiles": [],
        "date": "",
        "organizationId": "",
        "gameId": "",
        "gameName": "name",
        "winningTile": 0,
    })
}

/// Winners split by location completeness. Every winner is in exactly one list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortPartition {
    pub ready: Vec<Winner>,
    pub needs_location: Vec<Winner>,
}

impl CohortPartition {
    pub fn from_winners(winners: Vec<Winner>) -> Self {
        let (ready, needs_location) = winners
            .into_iter()
            .partition(|w| w.cohort() == WinnerCohort::Ready);
        Self {
            ready,
            needs_location,
        }
    }

    pub fn cohort(&self, cohort: WinnerCohort) -> &[Winner] {
        match cohort {
            WinnerCohort::Ready => &self.ready,
            WinnerCohort::NeedsLocation => &self.needs_location,
        }
    }

    pub fn len(&self) -> usize {
        self.ready.len() + self.needs_location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Template names used for each cohort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerTemplates {
    pub ready: String,
    pub needs_location: String,
}

impl WinnerTemplates {
    pub fn template_for(&self, cohort: WinnerCohort) -> &str {
        match cohort {
            WinnerCohort::Ready => &self.ready,
            WinnerCohort::NeedsLocation => &self.needs_location,
        }
    }
}

impl Default for WinnerTemplates {
    fn default() -> Self {
        Self {
            ready: WINNER_TEMPLATE.to_string(),
            needs_location: WINNER_NEEDS_LOCATION_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DispatchOutcome {
    #[serde(rename_all = "camelCase")]
    Sent { batches: usize },
    #[serde(rename_all = "camelCase")]
    Failed {
        total_batches: usize,
        failed_batches: usize,
        failed_recipients: usize,
        error: String,
    },
}

/// Result of sending one cohort's bulk job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CohortDispatch {
    pub cohort: WinnerCohort,
    pub template: String,
    pub recipients: usize,
    pub outcome: DispatchOutcome,
}

impl CohortDispatch {
    pub fn is_sent(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Sent { .. })
    }

    fn failed_recipients(&self) -> usize {
        match self.outcome {
            DispatchOutcome::Sent { .. } => 0,
            DispatchOutcome::Failed {
                failed_recipients, ..
            } => failed_recipients,
        }
    }
}

/// What happened when the winners of a game were notified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReport {
    pub game_id: String,
    pub winning_tile: i32,
    pub winners: usize,
    /// One entry per non-empty cohort.
    pub dispatches: Vec<CohortDispatch>,
}

impl NotificationReport {
    pub fn is_complete(&self) -> bool {
        self.dispatches.iter().all(CohortDispatch::is_sent)
    }

    pub fn dispatch_for(&self, cohort: WinnerCohort) -> Option<&CohortDispatch> {
        self.dispatches.iter().find(|d| d.cohort == cohort)
    }

    /// The partial failure this report describes, if any cohort failed.
    pub fn failure(&self) -> Option<PartialNotificationFailure> {
        let failed: Vec<&CohortDispatch> =
            self.dispatches.iter().filter(|d| !d.is_sent()).collect();
        if failed.is_empty() {
            return None;
        }
        Some(PartialNotificationFailure {
            game_id: self.game_id.clone(),
            failed_cohorts: failed.iter().map(|d| d.cohort).collect(),
            failed_recipients: failed.iter().map(|d| d.failed_recipients()).sum(),
            total_recipients: self.winners,
        })
    }
}

/// Some winners may not have been emailed; the winning tile stays set.
///
/// Re-run the notification for the game to retry. Recipients of batches that
/// already went out may receive the email twice.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "winners of game {game_id} only partly notified: {failed_recipients} of {total_recipients} recipients unconfirmed (cohorts: {})",
    failed_cohorts.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
)]
pub struct PartialNotificationFailure {
    pub game_id: String,
    pub failed_cohorts: Vec<WinnerCohort>,
    pub failed_recipients: usize,
    pub total_recipients: usize,
}

//! Donations domain models.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// A captured donation. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: String,
    /// Amount in cents.
    pub amount: i64,
    pub user_id: String,
    pub organization_id: String,
    pub game_id: Option<String>,
    pub transaction_id: String,
    pub date: DateTime<Utc>,
    pub tiles: Vec<i32>,
}

impl Donation {
    pub fn has_tile(&self, tile: i32) -> bool {
        self.tiles.contains(&tile)
    }
}

/// Input model for storing a donation after its charge settled
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewDonation {
    pub id: Option<String>,
    pub amount: i64,
    pub user_id: String,
    pub organization_id: String,
    pub game_id: Option<String>,
    pub transaction_id: String,
    pub date: DateTime<Utc>,
    pub tiles: Vec<i32>,
}

/// A donor's request to donate, optionally buying tiles on a game.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub amount: i64,
    pub currency: String,
    pub source: String,
    pub organization_id: String,
    pub game_id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tiles: Vec<i32>,
}

impl DonationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.amount <= 0 {
            return Err(
                ValidationError::InvalidInput("amount must be positive".to_string()).into(),
            );
        }
        if self.currency.trim().is_empty() {
            return Err(ValidationError::MissingField("currency".to_string()).into());
        }
        if self.source.trim().is_empty() {
            return Err(ValidationError::MissingField("source".to_string()).into());
        }
        if self.organization_id.trim().is_empty() {
            return Err(ValidationError::MissingField("organizationId".to_string()).into());
        }
        let unique: HashSet<i32> = self.tiles.iter().copied().collect();
        if unique.len() != self.tiles.len() {
            return Err(ValidationError::InvalidInput(
                "tiles must not contain duplicates".to_string(),
            )
            .into());
        }
        if self.game_id.is_none() && !self.tiles.is_empty() {
            return Err(ValidationError::InvalidInput(
                "tiles can only be bought on a game".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

//! Games domain models.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// A bingo board game.
///
/// A game is *active* while `start_time <= now < end_time` and *finished*
/// once `now >= end_time` or a winning tile has been chosen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub name: String,
    pub organization_ids: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub winning_tile: Option<i32>,
    pub board: Vec<i32>,
    /// Price of one tile, in cents.
    pub price: i64,
    pub stream_url: Option<String>,
}

impl Game {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time
    }

    pub fn has_ended_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }

    pub fn is_finished_at(&self, now: DateTime<Utc>) -> bool {
        self.has_ended_at(now) || self.winning_tile.is_some()
    }

    pub fn has_tile(&self, tile: i32) -> bool {
        self.board.contains(&tile)
    }

    pub fn accepts_organization(&self, organization_id: &str) -> bool {
        self.organization_ids.iter().any(|id| id == organization_id)
    }

    /// Minimum amount, in cents, a donation buying `tile_count` tiles must carry.
    pub fn minimum_amount_for(&self, tile_count: usize) -> i64 {
        self.price.saturating_mul(tile_count as i64)
    }
}

/// Input model for creating a new game
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewGame {
    pub id: Option<String>,
    pub name: String,
    pub organization_ids: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub board: Vec<i32>,
    pub price: Option<i64>,
    pub stream_url: Option<String>,
}

impl NewGame {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        if self.organization_ids.is_empty() {
            return Err(ValidationError::MissingField("organizationIds".to_string()).into());
        }
        if self.end_time < self.start_time {
            return Err(ValidationError::InvalidInput(
                "endTime must not be before startTime".to_string(),
            )
            .into());
        }
        if self.board.is_empty() {
            return Err(ValidationError::MissingField("board".to_string()).into());
        }
        let unique: HashSet<i32> = self.board.iter().copied().collect();
        if unique.len() != self.board.len() {
            return Err(ValidationError::InvalidInput(
                "board contains duplicate tiles".to_string(),
            )
            .into());
        }
        if matches!(self.price, Some(price) if price < 0) {
            return Err(
                ValidationError::InvalidInput("price must not be negative".to_string()).into(),
            );
        }
        Ok(())
    }
}

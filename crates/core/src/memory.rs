//! In-memory implementations of the persistence ports.
//!
//! Used by tests and by anything that wants the notifier or donation intake
//! without a database or a mail gateway. Each repository guards its state with one lock, so the
//! winning-tile compare-and-set is atomic here as well.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::DEFAULT_TILE_PRICE;
use crate::donations::{Donation, DonationRepositoryTrait, NewDonation};
use crate::errors::{Error, Result};
use crate::games::{Game, GameRepositoryTrait, NewGame};
use crate::mailing::{BulkDestination, BulkEmailClient, MailerError};
use crate::users::{NewUser, User, UserRepositoryTrait};

fn poisoned<E>(_: E) -> Error {
    Error::Unexpected("in-memory store lock poisoned".to_string())
}

#[derive(Default)]
pub struct InMemoryGameRepository {
    games: RwLock<HashMap<String, Game>>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `game` as-is, replacing any game with the same id.
    pub fn put(&self, game: Game) -> Result<()> {
        self.games
            .write()
            .map_err(poisoned)?
            .insert(game.id.clone(), game);
        Ok(())
    }
}

#[async_trait]
impl GameRepositoryTrait for InMemoryGameRepository {
    fn get_game(&self, game_id: &str) -> Result<Option<Game>> {
        Ok(self.games.read().map_err(poisoned)?.get(game_id).cloned())
    }

    fn list_active_games(&self, now: DateTime<Utc>) -> Result<Vec<Game>> {
        let mut active: Vec<Game> = self
            .games
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|g| g.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(active)
    }

    async fn insert_new_game(&self, new_game: NewGame) -> Result<Game> {
        let game = Game {
            id: new_game
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new_game.name,
            organization_ids: new_game.organization_ids,
            start_time: new_game.start_time,
            end_time: new_game.end_time,
            winning_tile: None,
            board: new_game.board,
            price: new_game.price.unwrap_or(DEFAULT_TILE_PRICE),
            stream_url: new_game.stream_url,
        };
        self.put(game.clone())?;
        Ok(game)
    }

    async fn set_winning_tile_if_unset(
        &self,
        game_id: &str,
        tile: i32,
        closed_at: DateTime<Utc>,
    ) -> Result<Option<Game>> {
        let mut games = self.games.write().map_err(poisoned)?;
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| Error::NotFound(format!("Game {}", game_id)))?;
        if game.winning_tile.is_some() {
            return Ok(None);
        }
        game.winning_tile = Some(tile);
        if game.end_time > closed_at {
            game.end_time = closed_at;
        }
        Ok(Some(game.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryDonationRepository {
    donations: RwLock<Vec<Donation>>,
}

impl InMemoryDonationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Result<Vec<Donation>> {
        Ok(self.donations.read().map_err(poisoned)?.clone())
    }
}

#[async_trait]
impl DonationRepositoryTrait for InMemoryDonationRepository {
    fn get_donation(&self, donation_id: &str) -> Result<Option<Donation>> {
        Ok(self
            .donations
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|d| d.id == donation_id)
            .cloned())
    }

    fn find_donations_by_game_and_tile(&self, game_id: &str, tile: i32) -> Result<Vec<Donation>> {
        Ok(self
            .donations
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|d| d.game_id.as_deref() == Some(game_id) && d.has_tile(tile))
            .cloned()
            .collect())
    }

    async fn insert_new_donation(&self, new_donation: NewDonation) -> Result<Donation> {
        let donation = Donation {
            id: new_donation
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            amount: new_donation.amount,
            user_id: new_donation.user_id,
            organization_id: new_donation.organization_id,
            game_id: new_donation.game_id,
            transaction_id: new_donation.transaction_id,
            date: new_donation.date,
            tiles: new_donation.tiles,
        };
        self.donations
            .write()
            .map_err(poisoned)?
            .push(donation.clone());
        Ok(donation)
    }

    async fn delete_donation(&self, donation_id: String) -> Result<usize> {
        let mut donations = self.donations.write().map_err(poisoned)?;
        let before = donations.len();
        donations.retain(|d| d.id != donation_id);
        Ok(before - donations.len())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, user: User) -> Result<()> {
        self.users
            .write()
            .map_err(poisoned)?
            .insert(user.id.clone(), user);
        Ok(())
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryUserRepository {
    fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.read().map_err(poisoned)?.get(user_id).cloned())
    }

    fn get_users_by_ids(&self, user_ids: &[String]) -> Result<Vec<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(user_ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect())
    }

    async fn insert_new_user(&self, new_user: NewUser) -> Result<User> {
        let user = User {
            id: new_user.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            location: new_user.location,
        };
        self.put(user.clone())?;
        Ok(user)
    }
}

/// One `send_batch` call seen by [`RecordingEmailClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    pub template: String,
    pub destinations: Vec<BulkDestination>,
    pub default_data: Value,
    pub delivered: bool,
}

/// Mail client that records every batch and can be told to fail some.
#[derive(Default)]
pub struct RecordingEmailClient {
    calls: Mutex<Vec<RecordedBatch>>,
    failing_addresses: Mutex<HashSet<String>>,
    failing_templates: Mutex<HashSet<String>>,
}

impl RecordingEmailClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every batch that was attempted, delivered or not.
    pub fn calls(&self) -> Vec<RecordedBatch> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_for_template(&self, template: &str) -> Vec<RecordedBatch> {
        self.calls()
            .into_iter()
            .filter(|c| c.template == template)
            .collect()
    }

    /// Addresses of every destination in a delivered batch.
    pub fn delivered_recipients(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.delivered)
            .flat_map(|c| c.destinations.into_iter().map(|d| d.to_address))
            .collect()
    }

    /// Any batch containing `address` will be rejected.
    pub fn fail_batches_containing(&self, address: &str) {
        if let Ok(mut addresses) = self.failing_addresses.lock() {
            addresses.insert(address.to_string());
        }
    }

    /// Every batch for `template` will be rejected.
    pub fn fail_template(&self, template: &str) {
        if let Ok(mut templates) = self.failing_templates.lock() {
            templates.insert(template.to_string());
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut addresses) = self.failing_addresses.lock() {
            addresses.clear();
        }
        if let Ok(mut templates) = self.failing_templates.lock() {
            templates.clear();
        }
    }

    fn should_fail(&self, destinations: &[BulkDestination], template: &str) -> bool {
        let template_fails = self
            .failing_templates
            .lock()
            .map(|t| t.contains(template))
            .unwrap_or(false);
        let address_fails = self
            .failing_addresses
            .lock()
            .map(|a| destinations.iter().any(|d| a.contains(&d.to_address)))
            .unwrap_or(false);
        template_fails || address_fails
    }
}

#[async_trait]
impl BulkEmailClient for RecordingEmailClient {
    async fn send_batch(
        &self,
        destinations: &[BulkDestination],
        template: &str,
        default_data: &Value,
    ) -> std::result::Result<(), MailerError> {
        let fail = self.should_fail(destinations, template);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedBatch {
                template: template.to_string(),
                destinations: destinations.to_vec(),
                default_data: default_data.clone(),
                delivered: !fail,
            });
        }
        if fail {
            return Err(MailerError::Rejected(format!(
                "{} rejected for {} destination(s)",
                template,
                destinations.len()
            )));
        }
        Ok(())
    }
}

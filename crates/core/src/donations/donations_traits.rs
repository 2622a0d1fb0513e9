use crate::donations::donations_model::{Donation, DonationRequest, NewDonation};
use crate::errors::Result;
use async_trait::async_trait;

/// Trait for donation repository operations
#[async_trait]
pub trait DonationRepositoryTrait: Send + Sync {
    fn get_donation(&self, donation_id: &str) -> Result<Option<Donation>>;
    /// Every donation on `game_id` whose tile set contains `tile`.
    fn find_donations_by_game_and_tile(&self, game_id: &str, tile: i32) -> Result<Vec<Donation>>;
    async fn insert_new_donation(&self, new_donation: NewDonation) -> Result<Donation>;
    async fn delete_donation(&self, donation_id: String) -> Result<usize>;
}

/// Trait for donation service operations
#[async_trait]
pub trait DonationServiceTrait: Send + Sync {
    fn get_donation(&self, donation_id: &str) -> Result<Donation>;
    async fn make_donation(&self, user_id: &str, request: DonationRequest) -> Result<Donation>;
    async fn delete_donation(&self, donation_id: String) -> Result<usize>;
}

use crate::errors::Result;
use crate::games::games_model::{Game, NewGame};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for game repository operations
#[async_trait]
pub trait GameRepositoryTrait: Send + Sync {
    fn get_game(&self, game_id: &str) -> Result<Option<Game>>;
    fn list_active_games(&self, now: DateTime<Utc>) -> Result<Vec<Game>>;
    async fn insert_new_game(&self, new_game: NewGame) -> Result<Game>;

    /// Sets the winning tile only while it is still null, as one atomic write.
    ///
    /// In the same write, `end_time` is moved back to `closed_at` when the game
    /// had not ended yet. Returns `Ok(None)` when a winning tile was already
    /// present and nothing changed, and a not-found error for an unknown game.
    async fn set_winning_tile_if_unset(
        &self,
        game_id: &str,
        tile: i32,
        closed_at: DateTime<Utc>,
    ) -> Result<Option<Game>>;
}

/// Trait for game service operations
#[async_trait]
pub trait GameServiceTrait: Send + Sync {
    fn get_game(&self, game_id: &str) -> Result<Game>;
    fn get_active_games(&self) -> Result<Vec<Game>>;
    async fn create_game(&self, new_game: NewGame) -> Result<Game>;
}

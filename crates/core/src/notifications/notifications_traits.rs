use async_trait::async_trait;

use super::notifications_model::{NotificationReport, Winner};
use crate::errors::Result;
use crate::games::Game;

/// Trait for winner selection and notification.
#[async_trait]
pub trait WinnerNotifierTrait: Send + Sync {
    /// Lists the winners of a game whose winning tile is set.
    fn get_game_winners(&self, game_id: &str) -> Result<Vec<Winner>>;

    /// Records the winning tile. Fails with `AlreadyFinalized` if one is set.
    async fn finalize_winning_tile(&self, game_id: &str, tile: i32) -> Result<Game>;

    /// Emails the winners of an already finalized game.
    ///
    /// Safe to call again after a partial failure; every winner is emailed
    /// again, including those who already received the message.
    async fn notify_winners(&self, game_id: &str) -> Result<NotificationReport>;

    /// Finalizes the winning tile, then notifies the winners.
    ///
    /// Mail failures do not undo the winning tile. They are reported in the
    /// returned [`NotificationReport`].
    async fn set_winning_tile_and_notify(
        &self,
        game_id: &str,
        tile: i32,
    ) -> Result<NotificationReport>;
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::info;

use crate::errors::{Error, Result};
use crate::games::games_model::{Game, NewGame};
use crate::games::games_traits::{GameRepositoryTrait, GameServiceTrait};

pub struct GameService {
    game_repository: Arc<dyn GameRepositoryTrait>,
}

impl GameService {
    pub fn new(game_repository: Arc<dyn GameRepositoryTrait>) -> Self {
        GameService { game_repository }
    }
}

#[async_trait]
impl GameServiceTrait for GameService {
    fn get_game(&self, game_id: &str) -> Result<Game> {
        self.game_repository
            .get_game(game_id)?
            .ok_or_else(|| Error::NotFound(format!("Game {}", game_id)))
    }

    fn get_active_games(&self) -> Result<Vec<Game>> {
        self.game_repository.list_active_games(Utc::now())
    }

    async fn create_game(&self, new_game: NewGame) -> Result<Game> {
        new_game.validate()?;
        let game = self.game_repository.insert_new_game(new_game).await?;
        info!(
            "Created game {} with {} tiles for {} organization(s)",
            game.id,
            game.board.len(),
            game.organization_ids.len()
        );
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_TILE_PRICE;
    use crate::memory::InMemoryGameRepository;
    use chrono::Duration;

    fn new_game(name: &str, offset_hours: i64) -> NewGame {
        let start = Utc::now() + Duration::hours(offset_hours);
        NewGame {
            id: None,
            name: name.to_string(),
            organization_ids: vec!["org1".to_string()],
            start_time: start - Duration::hours(1),
            end_time: start + Duration::hours(1),
            board: vec![1, 2, 3],
            price: None,
            stream_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_list_only_active() {
        let service = GameService::new(Arc::new(InMemoryGameRepository::new()));
        let live = service.create_game(new_game("Live", 0)).await.unwrap();
        service.create_game(new_game("Tomorrow", 24)).await.unwrap();

        assert_eq!(live.price, DEFAULT_TILE_PRICE);
        assert_eq!(live.winning_tile, None);
        let active = service.get_active_games().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, live.id);
        assert_eq!(service.get_game(&live.id).unwrap(), live);
    }

    #[tokio::test]
    async fn test_invalid_game_is_not_stored() {
        let repo = Arc::new(InMemoryGameRepository::new());
        let service = GameService::new(repo.clone());
        let mut game = new_game("Dupes", 0);
        game.board = vec![4, 4];

        assert!(matches!(
            service.create_game(game).await,
            Err(Error::Validation(_))
        ));
        assert!(repo.list_active_games(Utc::now()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_game_is_not_found() {
        let service = GameService::new(Arc::new(InMemoryGameRepository::new()));
        assert!(matches!(service.get_game("nope"), Err(Error::NotFound(_))));
    }
}

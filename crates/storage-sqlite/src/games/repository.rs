use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use cowchips_core::games::{Game, GameRepositoryTrait, NewGame};
use cowchips_core::{Error, Result};

use super::model::{GameDB, NewGameDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::games;

pub struct GameRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl GameRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        GameRepository { pool, writer }
    }
}

fn to_games(rows: Vec<GameDB>) -> Result<Vec<Game>> {
    rows.into_iter()
        .map(|row| Game::try_from(row).map_err(Error::from))
        .collect()
}

#[async_trait]
impl GameRepositoryTrait for GameRepository {
    fn get_game(&self, game_id: &str) -> Result<Option<Game>> {
        let mut conn = get_connection(&self.pool)?;
        games::table
            .find(game_id)
            .select(GameDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?
            .map(|row| Game::try_from(row).map_err(Error::from))
            .transpose()
    }

    fn list_active_games(&self, now: DateTime<Utc>) -> Result<Vec<Game>> {
        let mut conn = get_connection(&self.pool)?;
        let now = now.naive_utc();
        let rows = games::table
            .filter(games::start_time.le(now))
            .filter(games::end_time.gt(now))
            .order(games::start_time.asc())
            .select(GameDB::as_select())
            .load(&mut conn)
            .into_core()?;
        to_games(rows)
    }

    async fn insert_new_game(&self, new_game: NewGame) -> Result<Game> {
        let id = new_game
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let row = NewGameDB::from_domain(id, new_game)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Game> {
                let inserted = diesel::insert_into(games::table)
                    .values(&row)
                    .returning(GameDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Game::try_from(inserted)?)
            })
            .await
    }

    async fn set_winning_tile_if_unset(
        &self,
        game_id: &str,
        tile: i32,
        closed_at: DateTime<Utc>,
    ) -> Result<Option<Game>> {
        let game_id = game_id.to_string();
        let closed_at = closed_at.naive_utc();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Option<Game>> {
                let claimed = diesel::update(
                    games::table
                        .filter(games::id.eq(&game_id))
                        .filter(games::winning_tile.is_null()),
                )
                .set(games::winning_tile.eq(Some(tile)))
                .execute(conn)
                .map_err(StorageError::from)?;

                if claimed == 0 {
                    let exists = games::table
                        .find(&game_id)
                        .count()
                        .get_result::<i64>(conn)
                        .map_err(StorageError::from)?;
                    if exists == 0 {
                        return Err(Error::NotFound(format!("Game {}", game_id)));
                    }
                    return Ok(None);
                }

                diesel::update(
                    games::table
                        .filter(games::id.eq(&game_id))
                        .filter(games::end_time.gt(closed_at)),
                )
                .set(games::end_time.eq(closed_at))
                .execute(conn)
                .map_err(StorageError::from)?;

                let row = games::table
                    .find(&game_id)
                    .select(GameDB::as_select())
                    .first(conn)
                    .map_err(StorageError::from)?;
                Ok(Some(Game::try_from(row)?))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use chrono::Duration;

    fn setup() -> (tempfile::TempDir, GameRepository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.db");
        let path = path.to_str().unwrap();
        init(path).unwrap();
        let pool = create_pool(path).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer(pool.clone());
        (dir, GameRepository::new(pool, writer))
    }

    fn new_game(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> NewGame {
        NewGame {
            id: Some(id.to_string()),
            name: "Harvest Bingo".to_string(),
            organization_ids: vec!["org1".to_string(), "org2".to_string()],
            start_time: start,
            end_time: end,
            board: (1..=16).collect(),
            price: None,
            stream_url: Some("https://stream.example.org/live".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_game() {
        let (_dir, repo) = setup();
        let now = Utc::now();
        let created = repo
            .insert_new_game(new_game("g1", now, now + Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(created.price, 100);
        let loaded = repo.get_game("g1").unwrap().unwrap();
        assert_eq!(loaded.board, (1..=16).collect::<Vec<_>>());
        assert_eq!(loaded.organization_ids, vec!["org1", "org2"]);
        assert_eq!(loaded.winning_tile, None);
        assert!(repo.get_game("missing").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_games() {
        let (_dir, repo) = setup();
        let now = Utc::now();
        repo.insert_new_game(new_game("live", now - Duration::hours(1), now + Duration::hours(1)))
            .await
            .unwrap();
        repo.insert_new_game(new_game("later", now + Duration::hours(2), now + Duration::hours(3)))
            .await
            .unwrap();
        repo.insert_new_game(new_game("over", now - Duration::hours(3), now - Duration::hours(2)))
            .await
            .unwrap();

        let active: Vec<String> = repo
            .list_active_games(now)
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(active, vec!["live"]);
    }

    #[tokio::test]
    async fn test_winning_tile_is_set_once() {
        let (_dir, repo) = setup();
        let now = Utc::now();
        repo.insert_new_game(new_game("g1", now - Duration::hours(1), now + Duration::hours(1)))
            .await
            .unwrap();

        let first = repo
            .set_winning_tile_if_unset("g1", 5, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.winning_tile, Some(5));
        assert!(first.end_time <= now + Duration::seconds(1));

        let second = repo.set_winning_tile_if_unset("g1", 6, now).await.unwrap();
        assert!(second.is_none());
        assert_eq!(repo.get_game("g1").unwrap().unwrap().winning_tile, Some(5));
    }

    #[tokio::test]
    async fn test_end_time_in_the_past_is_kept() {
        let (_dir, repo) = setup();
        let now = Utc::now();
        let ended = now - Duration::hours(1);
        repo.insert_new_game(new_game("g1", now - Duration::hours(2), ended))
            .await
            .unwrap();

        let game = repo
            .set_winning_tile_if_unset("g1", 3, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(game.end_time.timestamp(), ended.timestamp());
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let (_dir, repo) = setup();
        let result = repo.set_winning_tile_if_unset("nope", 1, Utc::now()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_claims_have_one_winner() {
        let (_dir, repo) = setup();
        let repo = Arc::new(repo);
        let now = Utc::now();
        repo.insert_new_game(new_game("g1", now - Duration::hours(1), now + Duration::hours(1)))
            .await
            .unwrap();

        let handles: Vec<_> = (1..=10)
            .map(|tile| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.set_winning_tile_if_unset("g1", tile, Utc::now()).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}

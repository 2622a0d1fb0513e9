//! Database models for games.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;
use cowchips_core::constants::DEFAULT_TILE_PRICE;
use cowchips_core::games::{Game, NewGame};

/// Database model for games. Board and organization ids are JSON arrays.
#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::games)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameDB {
    pub id: String,
    pub name: String,
    pub organization_ids: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub winning_tile: Option<i32>,
    pub board: String,
    pub price: i64,
    pub stream_url: Option<String>,
}

/// Database model for creating a new game
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::games)]
pub struct NewGameDB {
    pub id: String,
    pub name: String,
    pub organization_ids: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub board: String,
    pub price: i64,
    pub stream_url: Option<String>,
}

impl TryFrom<GameDB> for Game {
    type Error = StorageError;

    fn try_from(db: GameDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            name: db.name,
            organization_ids: serde_json::from_str(&db.organization_ids)?,
            start_time: db.start_time.and_utc(),
            end_time: db.end_time.and_utc(),
            winning_tile: db.winning_tile,
            board: serde_json::from_str(&db.board)?,
            price: db.price,
            stream_url: db.stream_url,
        })
    }
}

impl NewGameDB {
    pub fn from_domain(id: String, game: NewGame) -> Result<Self, StorageError> {
        Ok(Self {
            id,
            name: game.name,
            organization_ids: serde_json::to_string(&game.organization_ids)?,
            start_time: game.start_time.naive_utc(),
            end_time: game.end_time.naive_utc(),
            board: serde_json::to_string(&game.board)?,
            price: game.price.unwrap_or(DEFAULT_TILE_PRICE),
            stream_url: game.stream_url,
        })
    }
}

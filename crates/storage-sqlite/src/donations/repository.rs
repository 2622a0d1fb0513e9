use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use cowchips_core::donations::{Donation, DonationRepositoryTrait, NewDonation};
use cowchips_core::Result;

use super::model::{DonationDB, DonationTileDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{donation_tiles, donations};

pub struct DonationRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl DonationRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        DonationRepository { pool, writer }
    }

    /// Loads the tiles of `rows` and assembles domain donations.
    fn with_tiles(conn: &mut SqliteConnection, rows: Vec<DonationDB>) -> Result<Vec<Donation>> {
        let tiles: Vec<DonationTileDB> = DonationTileDB::belonging_to(&rows)
            .select(DonationTileDB::as_select())
            .order(donation_tiles::tile.asc())
            .load(conn)
            .into_core()?;

        let mut by_donation: HashMap<String, Vec<i32>> = HashMap::new();
        for row in tiles {
            by_donation.entry(row.donation_id).or_default().push(row.tile);
        }
        Ok(rows
            .into_iter()
            .map(|row| {
                let tiles = by_donation.remove(&row.id).unwrap_or_default();
                row.into_domain(tiles)
            })
            .collect())
    }
}

#[async_trait]
impl DonationRepositoryTrait for DonationRepository {
    fn get_donation(&self, donation_id: &str) -> Result<Option<Donation>> {
        let mut conn = get_connection(&self.pool)?;
        let row = donations::table
            .find(donation_id)
            .select(DonationDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        match row {
            Some(row) => Ok(Self::with_tiles(&mut conn, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn find_donations_by_game_and_tile(&self, game_id: &str, tile: i32) -> Result<Vec<Donation>> {
        let mut conn = get_connection(&self.pool)?;
        let holding_tile = donation_tiles::table
            .filter(donation_tiles::tile.eq(tile))
            .select(donation_tiles::donation_id);
        let rows = donations::table
            .filter(donations::game_id.eq(game_id))
            .filter(donations::id.eq_any(holding_tile))
            .order(donations::date.asc())
            .select(DonationDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Self::with_tiles(&mut conn, rows)
    }

    async fn insert_new_donation(&self, new_donation: NewDonation) -> Result<Donation> {
        let id = new_donation
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let row = DonationDB::from_domain(id, &new_donation);
        let tiles: Vec<DonationTileDB> = new_donation
            .tiles
            .iter()
            .map(|&tile| DonationTileDB {
                donation_id: row.id.clone(),
                tile,
            })
            .collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Donation> {
                diesel::insert_into(donations::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if !tiles.is_empty() {
                    diesel::insert_into(donation_tiles::table)
                        .values(&tiles)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(row.into_domain(tiles.into_iter().map(|t| t.tile).collect()))
            })
            .await
    }

    async fn delete_donation(&self, donation_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(
                    donation_tiles::table.filter(donation_tiles::donation_id.eq(&donation_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(diesel::delete(donations::table.find(&donation_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}

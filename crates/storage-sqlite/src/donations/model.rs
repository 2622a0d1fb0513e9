//! Database models for donations and the tiles they bought.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use cowchips_core::donations::{Donation, NewDonation};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::donations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DonationDB {
    pub id: String,
    pub amount: i64,
    pub user_id: String,
    pub organization_id: String,
    pub game_id: Option<String>,
    pub transaction_id: String,
    pub date: NaiveDateTime,
}

/// One tile bought by a donation.
#[derive(Queryable, Identifiable, Insertable, Selectable, Associations, PartialEq, Debug, Clone)]
#[diesel(belongs_to(DonationDB, foreign_key = donation_id))]
#[diesel(table_name = crate::schema::donation_tiles)]
#[diesel(primary_key(donation_id, tile))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DonationTileDB {
    pub donation_id: String,
    pub tile: i32,
}

impl DonationDB {
    pub fn from_domain(id: String, donation: &NewDonation) -> Self {
        Self {
            id,
            amount: donation.amount,
            user_id: donation.user_id.clone(),
            organization_id: donation.organization_id.clone(),
            game_id: donation.game_id.clone(),
            transaction_id: donation.transaction_id.clone(),
            date: donation.date.naive_utc(),
        }
    }

    pub fn into_domain(self, tiles: Vec<i32>) -> Donation {
        Donation {
            id: self.id,
            amount: self.amount,
            user_id: self.user_id,
            organization_id: self.organization_id,
            game_id: self.game_id,
            transaction_id: self.transaction_id,
            date: self.date.and_utc(),
            tiles,
        }
    }
}

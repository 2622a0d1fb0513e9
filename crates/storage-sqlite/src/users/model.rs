//! Database models for users.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use cowchips_core::users::{Location, NewUser, User};

/// Database model for users. Location fields are flattened into columns.
#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserDB {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUserDB {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<UserDB> for User {
    fn from(db: UserDB) -> Self {
        let location = if db.address.is_none()
            && db.city.is_none()
            && db.state.is_none()
            && db.zip.is_none()
        {
            None
        } else {
            Some(Location {
                address: db.address,
                city: db.city,
                state: db.state,
                zip: db.zip,
            })
        };
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            phone: db.phone,
            location,
        }
    }
}

impl NewUserDB {
    pub fn from_domain(id: String, user: NewUser, created_at: NaiveDateTime) -> Self {
        let location = user.location.unwrap_or_default();
        Self {
            id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: location.address,
            city: location.city,
            state: location.state,
            zip: location.zip,
            created_at,
        }
    }
}

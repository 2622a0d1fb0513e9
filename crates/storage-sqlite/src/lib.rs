//! SQLite storage implementation for Cowchips.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `cowchips-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for games, donations and users
//! - Database-specific model types (with Diesel derives)
//!
//! Reads go through the r2d2 pool. Every write is executed by a single
//! writer actor inside an immediate transaction, which is what makes the
//! winning-tile compare-and-set safe under concurrent requests.
//!
//! ```text
//!      core (domain)
//!           │
//!           ▼
//!  storage-sqlite (this crate)
//!           │
//!           ▼
//!       SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod donations;
pub mod games;
pub mod users;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use donations::DonationRepository;
pub use games::GameRepository;
pub use users::UserRepository;

// Re-export from cowchips-core for convenience
pub use cowchips_core::errors::{DatabaseError, Error, Result};

//! Cowchips Core - domain entities, services and traits.
//!
//! This crate holds the business logic of the charity bingo backend: games,
//! donations, winner selection and notification, and the donation relay.
//! It is database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod constants;
pub mod donations;
pub mod errors;
pub mod events;
pub mod games;
pub mod mailing;
pub mod memory;
pub mod notifications;
pub mod payments;
pub mod relay;
pub mod users;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

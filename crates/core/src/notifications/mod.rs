//! Notifications module - winning tile selection and winner emails.
//!
//! A game's winning tile is written once, atomically. Every donor whose
//! donation on that game contains the tile is emailed: donors with a full
//! mailing address get the winner template, the rest get the template asking
//! them for their address.

mod notifications_model;
mod notifications_service;
mod notifications_traits;

pub use notifications_model::*;
pub use notifications_service::WinnerNotifier;
pub use notifications_traits::WinnerNotifierTrait;

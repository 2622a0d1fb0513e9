//! Relay module - donation broadcast to connected dashboards.
//!
//! A client that reports a donation (`donationOccur`) makes every other
//! connected client receive `updateAvailable` with the same payload. Donations
//! committed on the server are pushed to every subscriber.

mod relay_model;
mod relay_service;

pub use relay_model::{RelayMessage, SubscriberId};
pub use relay_service::{DonationRelay, Subscription};

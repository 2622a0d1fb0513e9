//! Donations module - tile purchases and donation intake.

mod donations_model;
mod donations_service;
mod donations_traits;

pub use donations_model::{Donation, DonationRequest, NewDonation};
pub use donations_service::DonationService;
pub use donations_traits::{DonationRepositoryTrait, DonationServiceTrait};

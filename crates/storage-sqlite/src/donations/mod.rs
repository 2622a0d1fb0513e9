mod model;
mod repository;

pub use model::{DonationDB, DonationTileDB};
pub use repository::DonationRepository;

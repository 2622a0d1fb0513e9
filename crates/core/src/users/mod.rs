//! Users module - donor contact and location details.

mod users_model;
mod users_traits;

pub use users_model::{Location, NewUser, User};
pub use users_traits::UserRepositoryTrait;

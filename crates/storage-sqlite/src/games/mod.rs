mod model;
mod repository;

pub use model::{GameDB, NewGameDB};
pub use repository::GameRepository;

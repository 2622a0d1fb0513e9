//! Games module - bingo boards, their play window and winning tile.

mod games_model;
mod games_service;
mod games_traits;

pub use games_model::{Game, NewGame};
pub use games_service::GameService;
pub use games_traits::{GameRepositoryTrait, GameServiceTrait};

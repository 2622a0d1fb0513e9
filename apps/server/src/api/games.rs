use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use cowchips_core::games::{Game, NewGame};

async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(new_game): Json<NewGame>,
) -> ApiResult<(StatusCode, Json<Game>)> {
    let game = state.game_service.create_game(new_game).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

async fn get_active_games(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Game>>> {
    let games = state.game_service.get_active_games()?;
    Ok(Json(games))
}

async fn get_game(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Game>> {
    let game = state.game_service.get_game(&id)?;
    Ok(Json(game))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/active", get(get_active_games))
        .route("/games/{id}", get(get_game))
}

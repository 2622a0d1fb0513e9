use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use cowchips_core::games::Game;
use cowchips_core::notifications::{NotificationReport, Winner};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct WinningTileRequest {
    pub tile: i32,
}

async fn get_game_winners(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Winner>>> {
    let winners = state.winner_notifier.get_game_winners(&id)?;
    Ok(Json(winners))
}

/// Records the winning tile now and emails the winners in the background.
async fn set_winning_tile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<WinningTileRequest>,
) -> ApiResult<(StatusCode, Json<Game>)> {
    let game = state
        .winner_notifier
        .finalize_winning_tile(&id, request.tile)
        .await?;

    let notifier = state.winner_notifier.clone();
    let game_id = game.id.clone();
    tokio::spawn(async move {
        match notifier.notify_winners(&game_id).await {
            Ok(report) if report.is_complete() => tracing::info!(
                "Notified {} winner(s) of game {}",
                report.winners,
                game_id
            ),
            // The notifier already logged which cohorts failed.
            Ok(_) => {}
            Err(err) => tracing::error!("Could not notify winners of game {}: {}", game_id, err),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(game)))
}

async fn notify_winners(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<NotificationReport>> {
    let report = state.winner_notifier.notify_winners(&id).await?;
    Ok(Json(report))
}

async fn delete_donation(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.donation_service.delete_donation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/games/{id}/winners", get(get_game_winners))
        .route("/admin/games/{id}/winning-tile", post(set_winning_tile))
        .route("/admin/games/{id}/notify-winners", post(notify_winners))
        .route("/admin/donations/{id}", delete(delete_donation))
}

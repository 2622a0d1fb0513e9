use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use cowchips_core::donations::{Donation, DonationRequest};

/// Header carrying the id of the signed-in donor, set by the auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

fn user_id(headers: &HeaderMap) -> ApiResult<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))
}

async fn make_donation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<DonationRequest>,
) -> ApiResult<(StatusCode, Json<Donation>)> {
    let user_id = user_id(&headers)?;
    let donation = state
        .donation_service
        .make_donation(&user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(donation)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/donations", post(make_donation))
}

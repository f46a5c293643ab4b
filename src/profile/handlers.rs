use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument};

use crate::auth::AuthUser;
use crate::error::PlannerError;
use crate::profile::dto::{ProfileResponse, PutProfileRequest};
use crate::profile::goals::compute_targets;
use crate::profile::repo;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(put_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let stored = repo::get(&state.db, user_id)
        .await
        .map_err(PlannerError::from)?
        .ok_or_else(|| PlannerError::NotFound("profile".into()))?;
    let targets = compute_targets(&stored.profile, &state.config.planner.macro_split)?;
    Ok(Json(ProfileResponse::new(stored, targets)))
}

#[instrument(skip(state, body))]
pub async fn put_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<PutProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    // Reject before writing: a stored profile must always yield targets.
    let targets = compute_targets(&body.profile, &state.config.planner.macro_split)?;
    let stored = repo::upsert(&state.db, user_id, &body.profile, &body.preferences)
        .await
        .map_err(PlannerError::from)?;
    info!(%user_id, calorie_goal = targets.calorie_goal, "profile saved");
    Ok(Json(ProfileResponse::new(stored, targets)))
}

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::PlannerError;
use crate::foods::repo::load_catalog;
use crate::meals::composer::RecentFoods;
use crate::meals::dto::{
    CommitPlanRequest, CommitResponse, DeleteResponse, HistoryRecordResponse, Pagination,
    RecommendRequest, RecommendResponse, SavePlanRequest,
};
use crate::meals::model::iso_date;
use crate::meals::services::{plan_from_selection, ExistingCheck};
use crate::profile::{goals::compute_targets, repo as profile_repo};
use crate::state::AppState;

/// Number of most recent saved plans consulted when breaking ties.
const RECENT_PLANS: i64 = 7;

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/plans", post(save_plan))
        .route("/plans/recommend", post(recommend_plan))
        .route("/plans/commit", post(commit_plan))
        .route("/plans/:date/existing", get(existing_plan))
}

pub fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history))
        .route("/history/:id", get(get_history_record).delete(delete_history_record))
        .route("/history/date/:date", delete(delete_history_for_date))
}

/// Draft plan for a date. Nothing is persisted.
#[instrument(skip(state, body))]
pub async fn recommend_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, (StatusCode, String)> {
    let stored = profile_repo::get(&state.db, user_id)
        .await
        .map_err(PlannerError::from)?
        .ok_or_else(|| PlannerError::NotFound("profile".into()))?;

    let composer = state.composer();
    let targets = compute_targets(&stored.profile, &composer.config().macro_split)?;
    let prefs = stored.preferences.with_preferred(body.preferred_tags);
    let catalog = load_catalog(&state.db).await?;
    let history = state.coordinator().history(user_id, RECENT_PLANS, 0).await?;
    let recent = RecentFoods::from_plans(history.iter().map(|r| &r.plan));

    let plan = composer.compose_with_history(&targets, &catalog, body.date, &prefs, &recent)?;
    info!(%user_id, date = %body.date, foods = plan.food_ids().count(), "draft plan composed");
    let summary = plan.summary();
    Ok(Json(RecommendResponse {
        targets,
        plan,
        summary,
    }))
}

#[instrument(skip(state))]
pub async fn existing_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(date): Path<String>,
) -> Result<Json<ExistingCheck>, (StatusCode, String)> {
    let date = iso_date::parse(&date)?;
    let check = state.coordinator().check_existing(user_id, date).await?;
    Ok(Json(check))
}

/// Saves a plan in one call. Without `replaceExisting` an existing plan for
/// the date is never overwritten and the request fails with 409.
#[instrument(skip(state, body))]
pub async fn save_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SavePlanRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<HistoryRecordResponse>), (StatusCode, String)> {
    let catalog = load_catalog(&state.db).await?;
    let plan = plan_from_selection(&catalog, body.date, &body.meals)?;
    let record = state
        .coordinator()
        .save(user_id, body.date, plan, body.replace_existing)
        .await?;

    let location = format!("/api/v1/history/{}", record.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(record.into()),
    ))
}

/// Check-then-commit. An existing plan with no decision is a 400.
#[instrument(skip(state, body))]
pub async fn commit_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CommitPlanRequest>,
) -> Result<Json<CommitResponse>, (StatusCode, String)> {
    let catalog = load_catalog(&state.db).await?;
    let plan = plan_from_selection(&catalog, body.date, &body.meals)?;
    let coordinator = state.coordinator();
    let draft = coordinator.check(user_id, plan).await?;
    let outcome = coordinator.commit(draft, body.replace_existing).await?;
    Ok(Json(outcome.into()))
}

#[instrument(skip(state))]
pub async fn list_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<HistoryRecordResponse>>, (StatusCode, String)> {
    if p.limit < 0 || p.offset < 0 {
        return Err(PlannerError::validation("limit and offset must be non-negative").into());
    }
    let records = state.coordinator().history(user_id, p.limit, p.offset).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_history_record(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryRecordResponse>, (StatusCode, String)> {
    let record = state.coordinator().record(user_id, id).await?;
    Ok(Json(record.into()))
}

#[instrument(skip(state))]
pub async fn delete_history_record(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, (StatusCode, String)> {
    let outcome = state.coordinator().delete_record(user_id, id).await?;
    Ok(Json(outcome.into()))
}

#[instrument(skip(state))]
pub async fn delete_history_for_date(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(date): Path<String>,
) -> Result<Json<DeleteResponse>, (StatusCode, String)> {
    let date = iso_date::parse(&date)?;
    let outcome = state.coordinator().delete_records_for_date(user_id, date).await?;
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod handlers_tests {
    use super::*;
    use crate::meals::dto::DeleteStatus;
    use crate::meals::history::history_tests::plan_for;
    use time::macros::date;

    #[tokio::test]
    async fn history_endpoints_work_against_in_memory_store() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        let day = date!(2024 - 07 - 01);

        let Json(check) = existing_plan(State(state.clone()), AuthUser(user), Path("2024-07-01".into()))
            .await
            .unwrap();
        assert!(!check.has_existing);

        let record = state
            .coordinator()
            .save(user, day, plan_for(day, ["egg", "rice", "tofu"]), false)
            .await
            .unwrap();

        let Json(list) = list_history(
            State(state.clone()),
            AuthUser(user),
            Query(Pagination { limit: 20, offset: 0 }),
        )
        .await
        .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].summary.totals.calories, 300.0);

        let Json(one) = get_history_record(State(state.clone()), AuthUser(user), Path(record.id))
            .await
            .unwrap();
        assert_eq!(one.record.id, record.id);

        let Json(deleted) = delete_history_for_date(State(state.clone()), AuthUser(user), Path("2024-07-01".into()))
            .await
            .unwrap();
        assert_eq!((deleted.deleted, deleted.status), (1, DeleteStatus::Deleted));

        let Json(again) = delete_history_record(State(state), AuthUser(user), Path(record.id))
            .await
            .unwrap();
        assert_eq!(again.status, DeleteStatus::NotFound);
    }

    #[tokio::test]
    async fn missing_record_and_bad_date_map_to_http_errors() {
        let state = AppState::fake();
        let user = Uuid::new_v4();

        let (status, _) = get_history_record(State(state.clone()), AuthUser(user), Path(Uuid::new_v4()))
            .await
            .err()
            .unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = existing_plan(State(state), AuthUser(user), Path("July 1st".into()))
            .await
            .err()
            .unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

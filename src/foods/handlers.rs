use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::foods::catalog::{alternatives, FoodCatalog};
use crate::foods::model::FoodItem;
use crate::foods::repo::load_catalog;
use crate::profile::model::DietaryPreferences;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AlternativesQuery {
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    3
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods))
        .route("/foods/:id/alternatives", get(food_alternatives))
}

#[instrument(skip(state))]
pub async fn list_foods(State(state): State<AppState>) -> Result<Json<Vec<FoodItem>>, (StatusCode, String)> {
    let catalog = load_catalog(&state.db).await?;
    Ok(Json(catalog.foods().to_vec()))
}

#[instrument(skip(state))]
pub async fn food_alternatives(
    State(state): State<AppState>,
    Path(food_id): Path<String>,
    Query(q): Query<AlternativesQuery>,
) -> Result<Json<Vec<FoodItem>>, (StatusCode, String)> {
    let catalog = load_catalog(&state.db).await?;
    let found = alternatives(&catalog, &food_id, &DietaryPreferences::default(), q.count)?;
    Ok(Json(found))
}

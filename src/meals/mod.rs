pub mod composer;
pub mod dto;
pub mod handlers;
pub mod history;
pub mod model;
pub mod repo;
mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::plan_routes())
        .merge(handlers::history_routes())
}

use axum::http::StatusCode;
use thiserror::Error;
use time::Date;
use tracing::{error, warn};

/// Failures surfaced by the planning engine.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Malformed profile, targets or plan. The caller fixes the input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The catalog cannot supply at least one food per meal slot.
    #[error("catalog insufficient: {0}")]
    CatalogInsufficient(String),

    /// Another writer created a plan for the same user and date first.
    #[error("a plan for {date} was created concurrently; re-check before saving")]
    ConcurrentModification { date: Date },

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl PlannerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::CatalogInsufficient(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConcurrentModification { .. } => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PlannerError> for (StatusCode, String) {
    fn from(e: PlannerError) -> Self {
        let status = e.status();
        match &e {
            PlannerError::Storage(inner) => {
                error!(error = %inner, "storage failure");
                (status, "internal error".into())
            }
            PlannerError::ConcurrentModification { .. } => {
                warn!(error = %e, "lost save race");
                (status, e.to_string())
            }
            _ => (status, e.to_string()),
        }
    }
}

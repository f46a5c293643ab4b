use serde::{Deserialize, Serialize};
use time::Date;

use crate::meals::history::HistoryRecord;
use crate::meals::model::{iso_date, DayPlan, MealSlot, PlanSummary};
use crate::meals::services::{DeleteOutcome, SaveOutcome};
use crate::profile::model::DailyTargets;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Unioned with the profile's preferred tags for this draft only.
    #[serde(default)]
    pub preferred_tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub targets: DailyTargets,
    pub plan: DayPlan,
    pub summary: PlanSummary,
}

/// A meal as the client holds it: slot plus catalog food ids.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSelection {
    pub meal_type: MealSlot,
    pub food_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePlanRequest {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meals: Vec<MealSelection>,
    #[serde(default)]
    pub replace_existing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitPlanRequest {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meals: Vec<MealSelection>,
    #[serde(default)]
    pub replace_existing: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecordResponse {
    #[serde(flatten)]
    pub record: HistoryRecord,
    pub summary: PlanSummary,
}

impl From<HistoryRecord> for HistoryRecordResponse {
    fn from(record: HistoryRecord) -> Self {
        let summary = record.plan.summary();
        Self { record, summary }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    Saved,
    Replaced,
    Aborted,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub status: CommitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<HistoryRecordResponse>,
}

impl From<SaveOutcome> for CommitResponse {
    fn from(outcome: SaveOutcome) -> Self {
        let (status, record) = match outcome {
            SaveOutcome::Saved(r) => (CommitStatus::Saved, Some(r.into())),
            SaveOutcome::Replaced(r) => (CommitStatus::Replaced, Some(r.into())),
            SaveOutcome::Aborted => (CommitStatus::Aborted, None),
        };
        Self { status, record }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    Deleted,
    NotFound,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
    pub status: DeleteStatus,
}

impl From<DeleteOutcome> for DeleteResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted(n) => Self {
                deleted: n,
                status: DeleteStatus::Deleted,
            },
            DeleteOutcome::NotFound => Self {
                deleted: 0,
                status: DeleteStatus::NotFound,
            },
        }
    }
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn save_request_defaults_to_no_replace() {
        let req: SavePlanRequest = serde_json::from_str(
            r#"{"date": "2024-06-01", "meals": [{"mealType": "lunch", "foodIds": ["rice"]}]}"#,
        )
        .unwrap();
        assert_eq!(req.date, date!(2024 - 06 - 01));
        assert!(!req.replace_existing);
        assert_eq!(req.meals[0].meal_type, MealSlot::Lunch);
    }

    #[test]
    fn commit_request_keeps_missing_decision_as_none() {
        let req: CommitPlanRequest =
            serde_json::from_str(r#"{"date": "2024-06-01", "meals": []}"#).unwrap();
        assert_eq!(req.replace_existing, None);
    }

    #[test]
    fn aborted_commit_has_no_record() {
        let json = serde_json::to_value(CommitResponse::from(SaveOutcome::Aborted)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "aborted"}));
    }

    #[test]
    fn delete_response_signals_no_op() {
        let json = serde_json::to_value(DeleteResponse::from(DeleteOutcome::NotFound)).unwrap();
        assert_eq!(json, serde_json::json!({"deleted": 0, "status": "not_found"}));
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!((p.limit, p.offset), (20, 0));
    }
}

use std::sync::Arc;

use serde::Serialize;
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PlannerError;
use crate::foods::catalog::FoodCatalog;
use crate::meals::dto::MealSelection;
use crate::meals::history::{HistoryRecord, HistoryStore, InsertOutcome};
use crate::meals::model::{DayPlan, Meal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingCheck {
    pub has_existing: bool,
}

/// A draft whose (user, date) key has been checked against history.
#[derive(Debug, Clone)]
pub struct CheckedDraft {
    user_id: Uuid,
    plan: DayPlan,
    existing: Option<Uuid>,
}

impl CheckedDraft {
    pub fn has_existing(&self) -> bool {
        self.existing.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(HistoryRecord),
    Replaced(HistoryRecord),
    /// The caller declined to replace an existing plan. Nothing was written.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(u64),
    /// Nothing matched. Deletion is idempotent, so this is not an error.
    NotFound,
}

impl DeleteOutcome {
    fn from_count(n: u64) -> Self {
        if n == 0 {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted(n)
        }
    }
}

/// Check-then-commit persistence of draft plans.
///
/// The check is advisory. Commits rely on the store's per-key uniqueness, so
/// a lost race between check and commit is reported as
/// `ConcurrentModification` instead of producing a second record.
#[derive(Clone)]
pub struct PlanPersistenceCoordinator {
    store: Arc<dyn HistoryStore>,
}

impl PlanPersistenceCoordinator {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    pub async fn check_existing(&self, user_id: Uuid, date: Date) -> Result<ExistingCheck, PlannerError> {
        let existing = self.store.find_by_date(user_id, date).await?;
        Ok(ExistingCheck {
            has_existing: existing.is_some(),
        })
    }

    /// Moves a draft into the checked state.
    pub async fn check(&self, user_id: Uuid, plan: DayPlan) -> Result<CheckedDraft, PlannerError> {
        let existing = self.store.find_by_date(user_id, plan.date()).await?;
        Ok(CheckedDraft {
            user_id,
            plan,
            existing: existing.map(|r| r.id),
        })
    }

    /// Completes a checked draft.
    ///
    /// Without an existing record the plan is inserted and the decision is
    /// ignored. With one, `replace_existing` must be given: `Some(true)`
    /// supersedes the record, `Some(false)` aborts without writing, `None`
    /// is a validation error.
    pub async fn commit(
        &self,
        draft: CheckedDraft,
        replace_existing: Option<bool>,
    ) -> Result<SaveOutcome, PlannerError> {
        let CheckedDraft {
            user_id,
            plan,
            existing,
        } = draft;
        let date = plan.date();

        if existing.is_none() {
            return self.insert(user_id, &plan).await.map(SaveOutcome::Saved);
        }

        match replace_existing {
            None => Err(PlannerError::validation(format!(
                "a plan for {date} already exists; replaceExisting must be decided"
            ))),
            Some(false) => {
                info!(%user_id, %date, "save aborted, existing plan kept");
                Ok(SaveOutcome::Aborted)
            }
            Some(true) => {
                let outcome = self.store.upsert(user_id, &plan).await?;
                info!(%user_id, %date, record_id = %outcome.record.id, replaced = outcome.replaced, "plan saved");
                Ok(if outcome.replaced {
                    SaveOutcome::Replaced(outcome.record)
                } else {
                    SaveOutcome::Saved(outcome.record)
                })
            }
        }
    }

    /// Single-call commit. `replace_existing == false` never overwrites: if a
    /// record for the date exists the call fails with
    /// `ConcurrentModification` and the caller should re-check.
    pub async fn save(
        &self,
        user_id: Uuid,
        date: Date,
        plan: DayPlan,
        replace_existing: bool,
    ) -> Result<HistoryRecord, PlannerError> {
        if plan.date() != date {
            return Err(PlannerError::validation(format!(
                "plan is for {}, not {date}",
                plan.date()
            )));
        }
        if !replace_existing {
            return self.insert(user_id, &plan).await;
        }
        let outcome = self.store.upsert(user_id, &plan).await?;
        info!(%user_id, %date, record_id = %outcome.record.id, replaced = outcome.replaced, "plan saved");
        Ok(outcome.record)
    }

    async fn insert(&self, user_id: Uuid, plan: &DayPlan) -> Result<HistoryRecord, PlannerError> {
        let date = plan.date();
        match self.store.insert(user_id, plan).await? {
            InsertOutcome::Created(record) => {
                info!(%user_id, %date, record_id = %record.id, "plan saved");
                Ok(record)
            }
            InsertOutcome::Duplicate => {
                warn!(%user_id, %date, "plan already exists for date");
                Err(PlannerError::ConcurrentModification { date })
            }
        }
    }

    pub async fn history(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<HistoryRecord>, PlannerError> {
        Ok(self.store.list(user_id, limit, offset).await?)
    }

    pub async fn record(&self, user_id: Uuid, record_id: Uuid) -> Result<HistoryRecord, PlannerError> {
        self.store
            .find_by_id(user_id, record_id)
            .await?
            .ok_or_else(|| PlannerError::NotFound(format!("history record {record_id}")))
    }

    pub async fn delete_record(&self, user_id: Uuid, record_id: Uuid) -> Result<DeleteOutcome, PlannerError> {
        let n = self.store.delete_by_id(user_id, record_id).await?;
        info!(%user_id, %record_id, deleted = n, "delete history record");
        Ok(DeleteOutcome::from_count(n))
    }

    pub async fn delete_records_for_date(&self, user_id: Uuid, date: Date) -> Result<DeleteOutcome, PlannerError> {
        let n = self.store.delete_by_date(user_id, date).await?;
        info!(%user_id, %date, deleted = n, "delete history for date");
        Ok(DeleteOutcome::from_count(n))
    }
}

/// Rebuilds a plan from client-held food ids so totals are always derived
/// from catalog data.
pub fn plan_from_selection<C: FoodCatalog + ?Sized>(
    catalog: &C,
    date: Date,
    selections: &[MealSelection],
) -> Result<DayPlan, PlannerError> {
    let mut meals = Vec::with_capacity(selections.len());
    for selection in selections {
        let foods = selection
            .food_ids
            .iter()
            .map(|id| {
                catalog
                    .get(id)
                    .cloned()
                    .ok_or_else(|| PlannerError::validation(format!("unknown food id {id}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        meals.push(Meal::new(selection.meal_type, foods)?);
    }
    DayPlan::new(date, meals)
}

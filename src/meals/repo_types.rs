use sqlx::{types::Json, FromRow};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::meals::history::HistoryRecord;
use crate::meals::model::DayPlan;

#[derive(Debug, FromRow)]
pub struct PlanRecordRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_date: Date,
    pub plan: Json<DayPlan>,
    pub updated_at: OffsetDateTime,
}

impl From<PlanRecordRow> for HistoryRecord {
    fn from(r: PlanRecordRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            date: r.plan_date,
            plan: r.plan.0,
            saved_at: r.updated_at,
        }
    }
}


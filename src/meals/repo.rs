use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::Date;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::meals::history::{HistoryRecord, HistoryStore, InsertOutcome, UpsertOutcome};
use crate::meals::model::DayPlan;
use crate::meals::repo_types::PlanRecordRow;

/// `plan_records` table. The (user_id, plan_date) unique constraint is what
/// makes concurrent inserts safe.
#[derive(Clone)]
pub struct PgHistoryStore {
    db: PgPool,
}

impl PgHistoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    record: PlanRecordRow,
    inserted: bool,
}

impl From<UpsertRow> for UpsertOutcome {
    fn from(r: UpsertRow) -> Self {
        Self {
            record: r.record.into(),
            replaced: !r.inserted,
        }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn find_by_date(&self, user_id: Uuid, date: Date) -> anyhow::Result<Option<HistoryRecord>> {
        let row = sqlx::query_as::<_, PlanRecordRow>(
            r#"
            SELECT id, user_id, plan_date, plan, updated_at
            FROM plan_records
            WHERE user_id = $1 AND plan_date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await
        .context("select plan record by date")?;
        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, user_id: Uuid, record_id: Uuid) -> anyhow::Result<Option<HistoryRecord>> {
        let row = sqlx::query_as::<_, PlanRecordRow>(
            r#"
            SELECT id, user_id, plan_date, plan, updated_at
            FROM plan_records
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(record_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("select plan record by id")?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> anyhow::Result<Vec<HistoryRecord>> {
        let rows = sqlx::query_as::<_, PlanRecordRow>(
            r#"
            SELECT id, user_id, plan_date, plan, updated_at
            FROM plan_records
            WHERE user_id = $1
            ORDER BY plan_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list plan records")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, user_id: Uuid, plan: &DayPlan) -> anyhow::Result<InsertOutcome> {
        let res = sqlx::query_as::<_, PlanRecordRow>(
            r#"
            INSERT INTO plan_records (id, user_id, plan_date, plan)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, plan_date, plan, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(plan.date())
        .bind(Json(plan))
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(row) => Ok(InsertOutcome::Created(row.into())),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e).context("insert plan record"),
        }
    }

    async fn upsert(&self, user_id: Uuid, plan: &DayPlan) -> anyhow::Result<UpsertOutcome> {
        // xmax is 0 only for a freshly inserted tuple.
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO plan_records (id, user_id, plan_date, plan)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, plan_date) DO UPDATE
               SET id = EXCLUDED.id,
                   plan = EXCLUDED.plan,
                   updated_at = now()
            RETURNING id, user_id, plan_date, plan, updated_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(plan.date())
        .bind(Json(plan))
        .fetch_one(&self.db)
        .await
        .context("upsert plan record")?;
        Ok(row.into())
    }

    async fn delete_by_id(&self, user_id: Uuid, record_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM plan_records WHERE id = $1 AND user_id = $2")
            .bind(record_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete plan record")?;
        Ok(res.rows_affected())
    }

    async fn delete_by_date(&self, user_id: Uuid, date: Date) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM plan_records WHERE user_id = $1 AND plan_date = $2")
            .bind(user_id)
            .bind(date)
            .execute(&self.db)
            .await
            .context("delete plan records for date")?;
        Ok(res.rows_affected())
    }
}

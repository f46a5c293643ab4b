use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::meals::model::{iso_date, DayPlan};

/// A saved day plan. At most one exists per (user, date).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub plan: DayPlan,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(HistoryRecord),
    /// A record for the same (user, date) already exists; nothing was written.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub record: HistoryRecord,
    pub replaced: bool,
}

/// Date-indexed persistence of saved plans.
///
/// Implementations must make `insert` fail with `Duplicate` rather than
/// create a second record for a (user, date) key, even under concurrent
/// calls.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn find_by_date(&self, user_id: Uuid, date: Date) -> anyhow::Result<Option<HistoryRecord>>;

    async fn find_by_id(&self, user_id: Uuid, record_id: Uuid) -> anyhow::Result<Option<HistoryRecord>>;

    /// Newest date first.
    async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> anyhow::Result<Vec<HistoryRecord>>;

    async fn insert(&self, user_id: Uuid, plan: &DayPlan) -> anyhow::Result<InsertOutcome>;

    /// Writes `plan` as the only record for its date, superseding any
    /// existing one under a fresh record id.
    async fn upsert(&self, user_id: Uuid, plan: &DayPlan) -> anyhow::Result<UpsertOutcome>;

    async fn delete_by_id(&self, user_id: Uuid, record_id: Uuid) -> anyhow::Result<u64>;

    async fn delete_by_date(&self, user_id: Uuid, date: Date) -> anyhow::Result<u64>;
}

/// Mutex-guarded map keyed by (user, date).
#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<HashMap<(Uuid, Date), HistoryRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_record(user_id: Uuid, plan: &DayPlan) -> HistoryRecord {
        HistoryRecord {
            id: Uuid::new_v4(),
            user_id,
            date: plan.date(),
            plan: plan.clone(),
            saved_at: OffsetDateTime::now_utc(),
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn find_by_date(&self, user_id: Uuid, date: Date) -> anyhow::Result<Option<HistoryRecord>> {
        Ok(self.records.lock().await.get(&(user_id, date)).cloned())
    }

    async fn find_by_id(&self, user_id: Uuid, record_id: Uuid) -> anyhow::Result<Option<HistoryRecord>> {
        let records = self.records.lock().await;
        Ok(records
            .values()
            .find(|r| r.user_id == user_id && r.id == record_id)
            .cloned())
    }

    async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> anyhow::Result<Vec<HistoryRecord>> {
        let records = self.records.lock().await;
        let mut mine: Vec<HistoryRecord> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(mine
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn insert(&self, user_id: Uuid, plan: &DayPlan) -> anyhow::Result<InsertOutcome> {
        let mut records = self.records.lock().await;
        let key = (user_id, plan.date());
        if records.contains_key(&key) {
            return Ok(InsertOutcome::Duplicate);
        }
        let record = Self::new_record(user_id, plan);
        records.insert(key, record.clone());
        Ok(InsertOutcome::Created(record))
    }

    async fn upsert(&self, user_id: Uuid, plan: &DayPlan) -> anyhow::Result<UpsertOutcome> {
        let record = Self::new_record(user_id, plan);
        let previous = self
            .records
            .lock()
            .await
            .insert((user_id, plan.date()), record.clone());
        Ok(UpsertOutcome {
            record,
            replaced: previous.is_some(),
        })
    }

    async fn delete_by_id(&self, user_id: Uuid, record_id: Uuid) -> anyhow::Result<u64> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, r| !(r.user_id == user_id && r.id == record_id));
        Ok((before - records.len()) as u64)
    }

    async fn delete_by_date(&self, user_id: Uuid, date: Date) -> anyhow::Result<u64> {
        Ok(self
            .records
            .lock()
            .await
            .remove(&(user_id, date))
            .map_or(0, |_| 1))
    }
}

#[cfg(test)]
pub(crate) mod history_tests {
    use super::*;
    use crate::foods::model::{FoodItem, Nutrients};
    use crate::meals::model::{Meal, MealSlot};
    use time::macros::date;

    pub(crate) fn plan_for(date: Date, foods: [&str; 3]) -> DayPlan {
        let meals = MealSlot::ALL
            .into_iter()
            .zip(foods)
            .map(|(slot, id)| {
                let food = FoodItem {
                    id: id.into(),
                    name: id.into(),
                    category: "misc".into(),
                    nutrients: Nutrients::new(100.0, 5.0, 10.0, 3.0),
                    tags: Default::default(),
                };
                Meal::new(slot, vec![food]).unwrap()
            })
            .collect();
        DayPlan::new(date, meals).unwrap()
    }

    #[tokio::test]
    async fn insert_refuses_second_record_for_same_date() {
        let store = InMemoryHistoryStore::new();
        let user = Uuid::new_v4();
        let plan = plan_for(date!(2024 - 01 - 02), ["oatmeal", "rice", "tofu"]);

        assert!(matches!(store.insert(user, &plan).await.unwrap(), InsertOutcome::Created(_)));
        assert_eq!(store.insert(user, &plan).await.unwrap(), InsertOutcome::Duplicate);

        // Same date for another user is a different key.
        assert!(matches!(
            store.insert(Uuid::new_v4(), &plan).await.unwrap(),
            InsertOutcome::Created(_)
        ));
    }

    #[tokio::test]
    async fn upsert_supersedes_with_new_id() {
        let store = InMemoryHistoryStore::new();
        let user = Uuid::new_v4();
        let day = date!(2024 - 01 - 02);
        let InsertOutcome::Created(first) = store
            .insert(user, &plan_for(day, ["oatmeal", "rice", "tofu"]))
            .await
            .unwrap()
        else {
            panic!("expected a created record");
        };

        let second = plan_for(day, ["egg", "beef", "spinach"]);
        let outcome = store.upsert(user, &second).await.unwrap();
        assert!(outcome.replaced);
        assert_ne!(outcome.record.id, first.id);

        let stored = store.find_by_date(user, day).await.unwrap().unwrap();
        assert_eq!(stored.plan, second);
        assert!(store.find_by_id(user, first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let store = InMemoryHistoryStore::new();
        let user = Uuid::new_v4();
        for day in [date!(2024 - 01 - 01), date!(2024 - 01 - 03), date!(2024 - 01 - 02)] {
            store.insert(user, &plan_for(day, ["a", "b", "c"])).await.unwrap();
        }
        let page = store.list(user, 2, 0).await.unwrap();
        let dates: Vec<Date> = page.iter().map(|r| r.date).collect();
        assert_eq!(dates, [date!(2024 - 01 - 03), date!(2024 - 01 - 02)]);
        assert_eq!(store.list(user, 2, 2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deletes_report_affected_rows() {
        let store = InMemoryHistoryStore::new();
        let user = Uuid::new_v4();
        let day = date!(2024 - 02 - 29);
        let InsertOutcome::Created(rec) = store.insert(user, &plan_for(day, ["a", "b", "c"])).await.unwrap() else {
            panic!("expected a created record");
        };

        assert_eq!(store.delete_by_id(Uuid::new_v4(), rec.id).await.unwrap(), 0);
        assert_eq!(store.delete_by_id(user, rec.id).await.unwrap(), 1);
        assert_eq!(store.delete_by_id(user, rec.id).await.unwrap(), 0);
        assert_eq!(store.delete_by_date(user, day).await.unwrap(), 0);
    }
}

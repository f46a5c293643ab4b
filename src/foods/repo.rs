use anyhow::Context;
use sqlx::{FromRow, PgPool};

use crate::error::PlannerError;
use crate::foods::catalog::InMemoryCatalog;
use crate::foods::model::{FoodItem, Nutrients};

#[derive(Debug, FromRow)]
pub struct FoodRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub tags: Vec<String>,
}

impl From<FoodRow> for FoodItem {
    fn from(r: FoodRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            category: r.category,
            nutrients: Nutrients::new(r.calories, r.protein, r.carbs, r.fat),
            tags: r.tags.into_iter().collect(),
        }
    }
}

pub async fn list_foods(db: &PgPool) -> anyhow::Result<Vec<FoodItem>> {
    let rows = sqlx::query_as::<_, FoodRow>(
        r#"
        SELECT id, name, category, calories, protein, carbs, fat, tags
        FROM foods
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await
    .context("list foods")?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Snapshot of the `foods` table for one planning call.
pub async fn load_catalog(db: &PgPool) -> Result<InMemoryCatalog, PlannerError> {
    let foods = list_foods(db).await?;
    InMemoryCatalog::new(foods)
}

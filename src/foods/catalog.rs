use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::PlannerError;
use crate::foods::model::FoodItem;
use crate::profile::model::DietaryPreferences;

/// Read-only view over the foods available for planning.
///
/// `foods` must yield items in a stable order; composition is deterministic
/// only for a fixed ordering.
pub trait FoodCatalog: Send + Sync {
    fn foods(&self) -> &[FoodItem];

    fn get(&self, id: &str) -> Option<&FoodItem> {
        self.foods().iter().find(|f| f.id == id)
    }

    fn is_empty(&self) -> bool {
        self.foods().is_empty()
    }
}

/// Catalog snapshot held in memory, ordered by food id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    foods: Vec<FoodItem>,
    index: HashMap<String, usize>,
}

impl InMemoryCatalog {
    pub fn new(mut foods: Vec<FoodItem>) -> Result<Self, PlannerError> {
        foods.sort_by(|a, b| a.id.cmp(&b.id));
        let mut index = HashMap::with_capacity(foods.len());
        for (pos, food) in foods.iter().enumerate() {
            if !food.nutrients.is_valid() {
                return Err(PlannerError::validation(format!(
                    "food {} has negative or non-finite nutrients",
                    food.id
                )));
            }
            if index.insert(food.id.clone(), pos).is_some() {
                return Err(PlannerError::validation(format!(
                    "duplicate food id {}",
                    food.id
                )));
            }
        }
        Ok(Self { foods, index })
    }
}

impl FoodCatalog for InMemoryCatalog {
    fn foods(&self) -> &[FoodItem] {
        &self.foods
    }

    fn get(&self, id: &str) -> Option<&FoodItem> {
        self.index.get(id).map(|&pos| &self.foods[pos])
    }
}

/// Ranks other eligible foods by how closely their nutrients match the
/// given food. Ties go to higher tag affinity, then the smaller id.
pub fn alternatives<C: FoodCatalog + ?Sized>(
    catalog: &C,
    food_id: &str,
    prefs: &DietaryPreferences,
    count: usize,
) -> Result<Vec<FoodItem>, PlannerError> {
    let reference = catalog
        .get(food_id)
        .ok_or_else(|| PlannerError::NotFound(format!("food {food_id}")))?;

    let mut ranked: Vec<(f64, i64, &FoodItem)> = catalog
        .foods()
        .iter()
        .filter(|f| f.id != reference.id && prefs.allows(f))
        .map(|f| {
            (
                f.nutrients.normalized_distance(&reference.nutrients),
                prefs.affinity(f),
                f,
            )
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.1.cmp(&a.1))
            .then_with(|| a.2.id.cmp(&b.2.id))
    });

    Ok(ranked
        .into_iter()
        .take(count)
        .map(|(_, _, f)| f.clone())
        .collect())
}

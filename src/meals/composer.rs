//! Greedy day-plan composition.
//!
//! Every slot gets a share of the daily targets. Foods are added one at a
//! time, each step taking the unused food that brings the slot's running
//! total closest to its share (normalized Euclidean distance over calories,
//! protein, carbs and fat). A slot stops growing at its item bound or when
//! no candidate improves the distance. A food is used at most once per day.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use time::Date;
use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::foods::catalog::FoodCatalog;
use crate::foods::model::{FoodItem, Nutrients};
use crate::meals::model::{DayPlan, Meal, MealSlot};
use crate::profile::model::{DailyTargets, DietaryPreferences};

/// Distances closer than this are treated as ties.
const DISTANCE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct MealComposer {
    config: PlannerConfig,
}

/// Day-level exclusion set shared by all slots.
struct SelectionState<'c> {
    used: HashSet<&'c str>,
    eligible: Vec<&'c FoodItem>,
}

impl<'c> SelectionState<'c> {
    fn remaining(&self) -> usize {
        self.eligible.len() - self.used.len()
    }

    fn available(&self) -> impl Iterator<Item = &'c FoodItem> + '_ {
        self.eligible
            .iter()
            .copied()
            .filter(|f| !self.used.contains(f.id.as_str()))
    }
}

/// Running state of the slot being filled.
struct SlotAccumulator<'c> {
    target: Nutrients,
    foods: Vec<&'c FoodItem>,
    totals: Nutrients,
    categories: HashSet<&'c str>,
    distance: f64,
}

impl<'c> SlotAccumulator<'c> {
    fn new(target: Nutrients) -> Self {
        Self {
            target,
            foods: Vec::new(),
            totals: Nutrients::default(),
            categories: HashSet::new(),
            distance: Nutrients::default().normalized_distance(&target),
        }
    }

    fn distance_with(&self, food: &FoodItem) -> f64 {
        (self.totals + food.nutrients).normalized_distance(&self.target)
    }

    fn push(&mut self, candidate: Candidate<'c>) {
        self.totals += candidate.food.nutrients;
        self.categories.insert(candidate.food.category.as_str());
        self.foods.push(candidate.food);
        self.distance = candidate.distance;
    }
}

/// How often each food appeared in the user's recent plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentFoods {
    counts: HashMap<String, usize>,
}

impl RecentFoods {
    pub fn from_plans<'p>(plans: impl IntoIterator<Item = &'p DayPlan>) -> Self {
        let mut counts = HashMap::new();
        for id in plans.into_iter().flat_map(DayPlan::food_ids) {
            *counts.entry(id.to_owned()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn count(&self, food_id: &str) -> usize {
        self.counts.get(food_id).copied().unwrap_or(0)
    }
}

#[derive(Clone, Copy)]
struct Candidate<'c> {
    food: &'c FoodItem,
    distance: f64,
    affinity: i64,
    repeats: usize,
}

impl Candidate<'_> {
    /// Smaller distance first, then higher tag affinity, then fewer recent
    /// appearances, then smaller id.
    fn rank(&self, other: &Self) -> Ordering {
        if (self.distance - other.distance).abs() > DISTANCE_EPSILON {
            return self
                .distance
                .partial_cmp(&other.distance)
                .unwrap_or(Ordering::Equal);
        }
        other
            .affinity
            .cmp(&self.affinity)
            .then_with(|| self.repeats.cmp(&other.repeats))
            .then_with(|| self.food.id.cmp(&other.food.id))
    }
}

fn better<'c>(current: Option<Candidate<'c>>, next: Candidate<'c>) -> Option<Candidate<'c>> {
    match current {
        Some(c) if c.rank(&next) != Ordering::Greater => Some(c),
        _ => Some(next),
    }
}

pub fn validate_targets(targets: &DailyTargets) -> Result<(), PlannerError> {
    let goals = [
        ("calorieGoal", targets.calorie_goal),
        ("proteinGoal", targets.protein_goal),
        ("carbsGoal", targets.carbs_goal),
        ("fatGoal", targets.fat_goal),
    ];
    for (name, value) in goals {
        if !(value.is_finite() && value >= 0.0) {
            return Err(PlannerError::validation(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
    }
    Ok(())
}

impl MealComposer {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The share of the daily targets a slot aims for.
    pub fn slot_target(&self, targets: &DailyTargets, slot: MealSlot) -> Nutrients {
        Nutrients::new(
            targets.calorie_goal,
            targets.protein_goal,
            targets.carbs_goal,
            targets.fat_goal,
        )
        .scaled(self.config.slot_shares.share(slot))
    }

    /// Builds a best-effort draft plan for `date`. The catalog is only read.
    ///
    /// # Errors
    ///
    /// `Validation` for negative or non-finite goals; `CatalogInsufficient`
    /// when the catalog is empty or has too few eligible foods to give every
    /// slot one item.
    pub fn compose<C: FoodCatalog + ?Sized>(
        &self,
        targets: &DailyTargets,
        catalog: &C,
        date: Date,
        prefs: &DietaryPreferences,
    ) -> Result<DayPlan, PlannerError> {
        self.compose_with_history(targets, catalog, date, prefs, &RecentFoods::default())
    }

    /// Like [`compose`](Self::compose), but among equally close candidates
    /// with equal affinity, foods eaten less often recently win.
    pub fn compose_with_history<C: FoodCatalog + ?Sized>(
        &self,
        targets: &DailyTargets,
        catalog: &C,
        date: Date,
        prefs: &DietaryPreferences,
        recent: &RecentFoods,
    ) -> Result<DayPlan, PlannerError> {
        validate_targets(targets)?;
        if catalog.is_empty() {
            return Err(PlannerError::CatalogInsufficient("the food catalog is empty".into()));
        }

        let eligible: Vec<&FoodItem> = catalog.foods().iter().filter(|f| prefs.allows(f)).collect();
        let slot_count = MealSlot::ALL.len();
        if eligible.len() < slot_count {
            return Err(PlannerError::CatalogInsufficient(format!(
                "{} eligible foods cannot fill {slot_count} meals",
                eligible.len()
            )));
        }

        let min_items = if eligible.len() < slot_count * self.config.min_items_per_meal {
            debug!(
                eligible = eligible.len(),
                "catalog too small for the configured minimum, using one item per meal"
            );
            1
        } else {
            self.config.min_items_per_meal
        };

        let mut state = SelectionState {
            used: HashSet::with_capacity(slot_count * self.config.max_items_per_meal),
            eligible,
        };

        let mut meals = Vec::with_capacity(slot_count);
        for (pos, slot) in MealSlot::ALL.into_iter().enumerate() {
            let reserved = min_items * (slot_count - pos - 1);
            let capacity = self
                .config
                .max_items_per_meal
                .min(state.remaining().saturating_sub(reserved));

            let acc = fill_slot(
                self.slot_target(targets, slot),
                &mut state,
                prefs,
                recent,
                min_items,
                capacity,
            );
            if acc.foods.is_empty() {
                return Err(PlannerError::CatalogInsufficient(format!(
                    "no food left for {slot}"
                )));
            }

            debug!(
                %slot,
                foods = ?acc.foods.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
                distance = acc.distance,
                "slot composed"
            );
            meals.push(Meal::new(slot, acc.foods.into_iter().cloned().collect())?);
        }

        DayPlan::new(date, meals)
    }
}

/// Greedily fills one slot. Candidates of a category not yet in the meal are
/// preferred whenever one of them is acceptable.
fn fill_slot<'c>(
    target: Nutrients,
    state: &mut SelectionState<'c>,
    prefs: &DietaryPreferences,
    recent: &RecentFoods,
    min_items: usize,
    capacity: usize,
) -> SlotAccumulator<'c> {
    let mut acc = SlotAccumulator::new(target);

    while acc.foods.len() < capacity {
        let mut best_fresh: Option<Candidate<'c>> = None;
        let mut best_any: Option<Candidate<'c>> = None;
        for food in state.available() {
            let candidate = Candidate {
                food,
                distance: acc.distance_with(food),
                affinity: prefs.affinity(food),
                repeats: recent.count(&food.id),
            };
            if !acc.categories.contains(food.category.as_str()) {
                best_fresh = better(best_fresh, candidate);
            }
            best_any = better(best_any, candidate);
        }

        let needed = acc.foods.len() < min_items;
        let acceptable =
            |c: &Candidate<'_>| needed || c.distance < acc.distance - DISTANCE_EPSILON;

        let Some(pick) = best_fresh
            .filter(acceptable)
            .or_else(|| best_any.filter(acceptable))
        else {
            break;
        };

        state.used.insert(pick.food.id.as_str());
        acc.push(pick);
    }

    acc
}

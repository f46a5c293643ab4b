use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::PlannerError;
use crate::foods::model::{FoodItem, Nutrients};

/// `YYYY-MM-DD` serde adapter for plan dates.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::macros::format_description;
    use time::Date;

    use crate::error::PlannerError;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }

    pub fn parse(text: &str) -> Result<Date, PlannerError> {
        Date::parse(text.trim(), format_description!("[year]-[month]-[day]"))
            .map_err(|e| PlannerError::validation(format!("invalid date {text:?}: {e}")))
    }
}

/// Relative tolerance when checking stored totals against recomputed ones.
const TOTALS_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }
}

impl FromStr for MealSlot {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            other => Err(PlannerError::validation(format!("unknown meal type {other:?}"))),
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One meal of a day. Totals are always the sum of the foods' nutrients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "MealRepr")]
pub struct Meal {
    meal_type: MealSlot,
    foods: Vec<FoodItem>,
    totals: Nutrients,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MealRepr {
    meal_type: MealSlot,
    foods: Vec<FoodItem>,
    totals: Option<Nutrients>,
}

impl TryFrom<MealRepr> for Meal {
    type Error = PlannerError;

    fn try_from(repr: MealRepr) -> Result<Self, Self::Error> {
        let meal = Meal::new(repr.meal_type, repr.foods)?;
        if let Some(stored) = repr.totals {
            if !stored.approx_eq(&meal.totals, TOTALS_TOLERANCE) {
                return Err(PlannerError::validation(format!(
                    "{} totals do not match its foods",
                    meal.meal_type
                )));
            }
        }
        Ok(meal)
    }
}

impl Meal {
    pub fn new(meal_type: MealSlot, foods: Vec<FoodItem>) -> Result<Self, PlannerError> {
        if foods.is_empty() {
            return Err(PlannerError::validation(format!("{meal_type} has no foods")));
        }
        if let Some(bad) = foods.iter().find(|f| !f.nutrients.is_valid()) {
            return Err(PlannerError::validation(format!(
                "food {} has negative or non-finite nutrients",
                bad.id
            )));
        }
        let totals = foods.iter().map(|f| &f.nutrients).sum();
        Ok(Self {
            meal_type,
            foods,
            totals,
        })
    }

    pub fn meal_type(&self) -> MealSlot {
        self.meal_type
    }

    pub fn foods(&self) -> &[FoodItem] {
        &self.foods
    }

    pub fn totals(&self) -> Nutrients {
        self.totals
    }

    pub fn total_calories(&self) -> f64 {
        self.totals.calories
    }

    pub fn total_protein(&self) -> f64 {
        self.totals.protein
    }

    pub fn total_carbs(&self) -> f64 {
        self.totals.carbs
    }

    pub fn total_fat(&self) -> f64 {
        self.totals.fat
    }
}

/// A full day: exactly one meal per slot, in slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DayPlanRepr")]
pub struct DayPlan {
    #[serde(with = "iso_date")]
    date: Date,
    meals: Vec<Meal>,
}

#[derive(Deserialize)]
struct DayPlanRepr {
    #[serde(with = "iso_date")]
    date: Date,
    meals: Vec<Meal>,
}

impl TryFrom<DayPlanRepr> for DayPlan {
    type Error = PlannerError;

    fn try_from(repr: DayPlanRepr) -> Result<Self, Self::Error> {
        DayPlan::new(repr.date, repr.meals)
    }
}

impl DayPlan {
    pub fn new(date: Date, mut meals: Vec<Meal>) -> Result<Self, PlannerError> {
        meals.sort_by_key(|m| m.meal_type);
        let slots: Vec<MealSlot> = meals.iter().map(|m| m.meal_type).collect();
        if slots != MealSlot::ALL {
            return Err(PlannerError::validation(format!(
                "a day plan needs exactly one breakfast, lunch and dinner, got {slots:?}"
            )));
        }
        Ok(Self { date, meals })
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    pub fn meal(&self, slot: MealSlot) -> &Meal {
        // Slots are complete and sorted by construction.
        &self.meals[slot as usize]
    }

    pub fn totals(&self) -> Nutrients {
        self.meals.iter().map(|m| m.totals).sum()
    }

    pub fn food_ids(&self) -> impl Iterator<Item = &str> {
        self.meals
            .iter()
            .flat_map(|m| m.foods.iter().map(|f| f.id.as_str()))
    }

    pub fn summary(&self) -> PlanSummary {
        let totals = self.totals();
        let slot_calorie_percent = self
            .meals
            .iter()
            .map(|m| SlotShare {
                meal_type: m.meal_type,
                percent: if totals.calories > 0.0 {
                    m.totals.calories / totals.calories * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        PlanSummary {
            totals,
            slot_calorie_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotShare {
    pub meal_type: MealSlot,
    pub percent: f64,
}

/// Day totals and each slot's share of the day's calories.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub totals: Nutrients,
    pub slot_calorie_percent: Vec<SlotShare>,
}

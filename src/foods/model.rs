use std::collections::BTreeSet;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Calories (kcal) and macro-nutrients (g) of a serving or an aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Nutrients {
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.calories * factor,
            self.protein * factor,
            self.carbs * factor,
            self.fat * factor,
        )
    }

    pub fn axes(&self) -> [f64; 4] {
        [self.calories, self.protein, self.carbs, self.fat]
    }

    pub fn is_valid(&self) -> bool {
        self.axes().iter().all(|v| v.is_finite() && *v >= 0.0)
    }

    /// Euclidean distance between `self` and `target`, each axis divided by
    /// the target's value so the four axes are commensurate. Zero target
    /// axes are measured in absolute units.
    pub fn normalized_distance(&self, target: &Nutrients) -> f64 {
        self.axes()
            .iter()
            .zip(target.axes())
            .map(|(actual, goal)| {
                let scale = if goal > 0.0 { goal } else { 1.0 };
                let delta = (actual - goal) / scale;
                delta * delta
            })
            .sum::<f64>()
            .sqrt()
    }

    pub fn approx_eq(&self, other: &Nutrients, tolerance: f64) -> bool {
        self.axes()
            .iter()
            .zip(other.axes())
            .all(|(a, b)| (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0))
    }
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(self, rhs: Nutrients) -> Nutrients {
        Nutrients::new(
            self.calories + rhs.calories,
            self.protein + rhs.protein,
            self.carbs + rhs.carbs,
            self.fat + rhs.fat,
        )
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Nutrients) {
        *self = *self + rhs;
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Nutrients>>(iter: I) -> Self {
        iter.fold(Nutrients::default(), Add::add)
    }
}

impl<'a> Sum<&'a Nutrients> for Nutrients {
    fn sum<I: Iterator<Item = &'a Nutrients>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// A catalog entry. Nutrients are per serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl FoodItem {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn count_tags<'a, I>(&self, tags: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        tags.into_iter().filter(|t| self.tags.contains(*t)).count()
    }
}

#[cfg(test)]
mod nutrients_tests {
    use super::*;

    #[test]
    fn sums_component_wise() {
        let total: Nutrients = [
            Nutrients::new(100.0, 10.0, 5.0, 2.0),
            Nutrients::new(50.0, 1.0, 10.0, 0.5),
        ]
        .iter()
        .sum();
        assert_eq!(total, Nutrients::new(150.0, 11.0, 15.0, 2.5));
    }

    #[test]
    fn distance_is_zero_on_target() {
        let target = Nutrients::new(600.0, 45.0, 70.0, 20.0);
        assert_eq!(target.normalized_distance(&target), 0.0);
    }

    #[test]
    fn distance_normalizes_axes() {
        let target = Nutrients::new(1000.0, 100.0, 100.0, 10.0);
        // Half of every axis is the same relative miss: sqrt(4 * 0.25) = 1.
        let half = target.scaled(0.5);
        assert!((half.normalized_distance(&target) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_target_axis_uses_absolute_units() {
        let target = Nutrients::new(100.0, 0.0, 0.0, 0.0);
        let actual = Nutrients::new(100.0, 2.0, 0.0, 0.0);
        assert!((actual.normalized_distance(&target) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn food_serializes_flat() {
        let food = FoodItem {
            id: "egg".into(),
            name: "Egg".into(),
            category: "eggs".into(),
            nutrients: Nutrients::new(147.0, 12.6, 1.3, 10.6),
            tags: ["mild".to_string()].into_iter().collect(),
        };
        let json = serde_json::to_value(&food).unwrap();
        assert_eq!(json["calories"], 147.0);
        assert_eq!(json["tags"][0], "mild");
    }
}

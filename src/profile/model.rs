use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foods::model::FoodItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => anyhow::bail!("unknown gender {other:?}"),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    /// TDEE multiplier applied to the basal metabolic rate.
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            other => anyhow::bail!("unknown activity level {other:?}"),
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physiological profile used to derive daily targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub age: u32,
    /// kg
    pub weight: f64,
    /// cm
    pub height: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

/// Daily goals in kcal and grams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTargets {
    pub calorie_goal: f64,
    pub protein_goal: f64,
    pub carbs_goal: f64,
    pub fat_goal: f64,
}

/// Taste and safety preferences that steer composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryPreferences {
    #[serde(default)]
    pub preferred_tags: BTreeSet<String>,
    #[serde(default)]
    pub avoided_tags: BTreeSet<String>,
    #[serde(default)]
    pub allergens: BTreeSet<String>,
}

impl DietaryPreferences {
    /// A food carrying any allergen tag is never eligible.
    pub fn allows(&self, food: &FoodItem) -> bool {
        !self.allergens.iter().any(|a| food.has_tag(a))
    }

    /// Preferred tag matches minus avoided tag matches.
    pub fn affinity(&self, food: &FoodItem) -> i64 {
        food.count_tags(&self.preferred_tags) as i64 - food.count_tags(&self.avoided_tags) as i64
    }

    pub fn with_preferred<I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.preferred_tags.extend(extra);
        self
    }
}

#[cfg(test)]
mod model_tests {
    use super::*;
    use crate::foods::model::Nutrients;

    #[test]
    fn parses_enums_case_insensitively() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(
            "very_active".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::VeryActive
        );
        assert!("couch".parse::<ActivityLevel>().is_err());
    }

    #[test]
    fn profile_uses_camel_case_and_snake_enums() {
        let json = serde_json::json!({
            "age": 30,
            "weight": 70.0,
            "height": 175.0,
            "gender": "male",
            "activityLevel": "very_active"
        });
        let p: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(p.activity_level, ActivityLevel::VeryActive);
    }

    #[test]
    fn affinity_counts_preferred_minus_avoided() {
        let food = FoodItem {
            id: "orange".into(),
            name: "Orange".into(),
            category: "fruit".into(),
            nutrients: Nutrients::new(47.0, 0.9, 11.8, 0.1),
            tags: ["sour".to_string(), "sweet".to_string()].into_iter().collect(),
        };
        let prefs = DietaryPreferences {
            preferred_tags: ["sweet".to_string()].into_iter().collect(),
            avoided_tags: ["sour".to_string()].into_iter().collect(),
            ..Default::default()
        }
        .with_preferred(["sour".to_string()]);
        assert_eq!(prefs.affinity(&food), 1);
        assert!(prefs.allows(&food));
    }
}

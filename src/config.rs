use std::str::FromStr;

use anyhow::Context;
use crate::meals::model::MealSlot;

const SHARE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Fraction of daily calories assigned to each macro-nutrient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroSplit {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Default for MacroSplit {
    fn default() -> Self {
        Self {
            protein: 0.30,
            carbs: 0.45,
            fat: 0.25,
        }
    }
}

/// Fraction of the daily targets each meal slot aims for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotShares {
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
}

impl Default for SlotShares {
    fn default() -> Self {
        Self {
            breakfast: 0.25,
            lunch: 0.40,
            dinner: 0.35,
        }
    }
}

impl SlotShares {
    pub fn share(&self, slot: MealSlot) -> f64 {
        match slot {
            MealSlot::Breakfast => self.breakfast,
            MealSlot::Lunch => self.lunch,
            MealSlot::Dinner => self.dinner,
        }
    }
}

/// Product policy for goal computation and meal composition.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub macro_split: MacroSplit,
    pub slot_shares: SlotShares,
    pub min_items_per_meal: usize,
    pub max_items_per_meal: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            macro_split: MacroSplit::default(),
            slot_shares: SlotShares::default(),
            min_items_per_meal: 2,
            max_items_per_meal: 5,
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the policy from a key lookup, falling back to defaults for
    /// absent keys. Present but unparsable values are errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let cfg = Self {
            macro_split: MacroSplit {
                protein: parse_or(&lookup, "PLANNER_PROTEIN_SHARE", d.macro_split.protein)?,
                carbs: parse_or(&lookup, "PLANNER_CARBS_SHARE", d.macro_split.carbs)?,
                fat: parse_or(&lookup, "PLANNER_FAT_SHARE", d.macro_split.fat)?,
            },
            slot_shares: SlotShares {
                breakfast: parse_or(&lookup, "PLANNER_BREAKFAST_SHARE", d.slot_shares.breakfast)?,
                lunch: parse_or(&lookup, "PLANNER_LUNCH_SHARE", d.slot_shares.lunch)?,
                dinner: parse_or(&lookup, "PLANNER_DINNER_SHARE", d.slot_shares.dinner)?,
            },
            min_items_per_meal: parse_or(&lookup, "PLANNER_MIN_ITEMS_PER_MEAL", d.min_items_per_meal)?,
            max_items_per_meal: parse_or(&lookup, "PLANNER_MAX_ITEMS_PER_MEAL", d.max_items_per_meal)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let m = self.macro_split;
        check_shares("macro split", &[m.protein, m.carbs, m.fat])?;
        let s = self.slot_shares;
        check_shares("slot shares", &[s.breakfast, s.lunch, s.dinner])?;
        anyhow::ensure!(
            self.min_items_per_meal >= 1,
            "min_items_per_meal must be at least 1"
        );
        anyhow::ensure!(
            self.min_items_per_meal <= self.max_items_per_meal,
            "min_items_per_meal ({}) exceeds max_items_per_meal ({})",
            self.min_items_per_meal,
            self.max_items_per_meal
        );
        Ok(())
    }
}

fn check_shares(what: &str, shares: &[f64]) -> anyhow::Result<()> {
    anyhow::ensure!(
        shares.iter().all(|s| s.is_finite() && *s >= 0.0),
        "{what} must be non-negative fractions"
    );
    let sum: f64 = shares.iter().sum();
    anyhow::ensure!(
        (sum - 1.0).abs() <= SHARE_TOLERANCE,
        "{what} must sum to 1.0, got {sum}"
    );
    Ok(())
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub planner: PlannerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutriplan".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutriplan-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let planner = PlannerConfig::from_env()?;
        Ok(Self {
            database_url,
            jwt,
            planner,
        })
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_policy() {
        let cfg = PlannerConfig::from_lookup(lookup(&[])).expect("defaults are valid");
        assert_eq!(cfg, PlannerConfig::default());
        assert_eq!(cfg.macro_split.protein, 0.30);
        assert_eq!(cfg.slot_shares.share(MealSlot::Lunch), 0.40);
        assert_eq!(cfg.max_items_per_meal, 5);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = PlannerConfig::from_lookup(lookup(&[
            ("PLANNER_BREAKFAST_SHARE", "0.3"),
            ("PLANNER_LUNCH_SHARE", "0.4"),
            ("PLANNER_DINNER_SHARE", "0.3"),
            ("PLANNER_MAX_ITEMS_PER_MEAL", "4"),
        ]))
        .expect("valid overrides");
        assert_eq!(cfg.slot_shares.breakfast, 0.3);
        assert_eq!(cfg.max_items_per_meal, 4);
    }

    #[test]
    fn rejects_shares_not_summing_to_one() {
        let err = PlannerConfig::from_lookup(lookup(&[("PLANNER_PROTEIN_SHARE", "0.5")]))
            .unwrap_err();
        assert!(err.to_string().contains("macro split"));
    }

    #[test]
    fn rejects_unparsable_values() {
        let err = PlannerConfig::from_lookup(lookup(&[("PLANNER_MIN_ITEMS_PER_MEAL", "two")]))
            .unwrap_err();
        assert!(err.to_string().contains("PLANNER_MIN_ITEMS_PER_MEAL"));
    }

    #[test]
    fn rejects_min_above_max() {
        let err = PlannerConfig::from_lookup(lookup(&[
            ("PLANNER_MIN_ITEMS_PER_MEAL", "6"),
            ("PLANNER_MAX_ITEMS_PER_MEAL", "5"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }
}

//! Daily energy and macro-nutrient targets from a physiological profile.
//!
//! BMR follows Mifflin-St Jeor; TDEE scales it by the activity factor and the
//! configured macro split divides TDEE into grams.

use crate::config::MacroSplit;
use crate::error::PlannerError;
use crate::profile::model::{DailyTargets, Gender, Profile};

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

pub fn validate_profile(profile: &Profile) -> Result<(), PlannerError> {
    if profile.age == 0 {
        return Err(PlannerError::validation("age must be greater than 0"));
    }
    if !(profile.weight.is_finite() && profile.weight > 0.0) {
        return Err(PlannerError::validation("weight must be a positive number of kg"));
    }
    if !(profile.height.is_finite() && profile.height > 0.0) {
        return Err(PlannerError::validation("height must be a positive number of cm"));
    }
    Ok(())
}

pub fn basal_metabolic_rate(profile: &Profile) -> f64 {
    let base = 10.0 * profile.weight + 6.25 * profile.height - 5.0 * f64::from(profile.age);
    match profile.gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

/// Computes daily targets for a valid profile.
///
/// # Errors
///
/// `PlannerError::Validation` when the profile breaks its field constraints,
/// or when the formula yields a non-positive energy expenditure (extreme but
/// technically valid inputs such as a very small body at a high age).
pub fn compute_targets(profile: &Profile, split: &MacroSplit) -> Result<DailyTargets, PlannerError> {
    validate_profile(profile)?;

    let calorie_goal = basal_metabolic_rate(profile) * profile.activity_level.factor();
    if !(calorie_goal.is_finite() && calorie_goal > 0.0) {
        return Err(PlannerError::validation(format!(
            "profile yields a non-positive calorie goal ({calorie_goal:.1} kcal)"
        )));
    }

    Ok(DailyTargets {
        calorie_goal,
        protein_goal: calorie_goal * split.protein / KCAL_PER_G_PROTEIN,
        carbs_goal: calorie_goal * split.carbs / KCAL_PER_G_CARBS,
        fat_goal: calorie_goal * split.fat / KCAL_PER_G_FAT,
    })
}

#[cfg(test)]
mod goals_tests {
    use super::*;
    use crate::profile::model::ActivityLevel;

    fn reference_profile() -> Profile {
        Profile {
            age: 30,
            weight: 70.0,
            height: 175.0,
            gender: Gender::Male,
            activity_level: ActivityLevel::Moderate,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn reference_male_moderate() {
        let p = reference_profile();
        assert!(close(basal_metabolic_rate(&p), 1648.75));

        let t = compute_targets(&p, &MacroSplit::default()).unwrap();
        assert!(close(t.calorie_goal, 1648.75 * 1.55));
        assert!((t.calorie_goal - 2555.6).abs() < 0.1);
        assert!((t.protein_goal - 191.7).abs() < 0.1);
    }

    #[test]
    fn female_offset_is_minus_161() {
        let mut p = reference_profile();
        p.gender = Gender::Female;
        assert!(close(basal_metabolic_rate(&p), 1648.75 - 166.0));
    }

    #[test]
    fn macro_split_reconstructs_calories() {
        for level in [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
        ] {
            let mut p = reference_profile();
            p.activity_level = level;
            let t = compute_targets(&p, &MacroSplit::default()).unwrap();
            let rebuilt = t.protein_goal * KCAL_PER_G_PROTEIN
                + t.carbs_goal * KCAL_PER_G_CARBS
                + t.fat_goal * KCAL_PER_G_FAT;
            assert!(close(rebuilt, t.calorie_goal), "{level}: {rebuilt} vs {}", t.calorie_goal);
            assert!(t.protein_goal > 0.0 && t.carbs_goal > 0.0 && t.fat_goal > 0.0);
        }
    }

    #[test]
    fn deterministic() {
        let p = reference_profile();
        let a = compute_targets(&p, &MacroSplit::default()).unwrap();
        let b = compute_targets(&p, &MacroSplit::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_fields() {
        let split = MacroSplit::default();
        let mut p = reference_profile();
        p.age = 0;
        assert!(matches!(compute_targets(&p, &split), Err(PlannerError::Validation(_))));

        let mut p = reference_profile();
        p.weight = -3.0;
        assert!(matches!(compute_targets(&p, &split), Err(PlannerError::Validation(_))));

        let mut p = reference_profile();
        p.height = f64::NAN;
        assert!(matches!(compute_targets(&p, &split), Err(PlannerError::Validation(_))));
    }

    #[test]
    fn rejects_non_positive_energy() {
        let p = Profile {
            age: 120,
            weight: 1.0,
            height: 1.0,
            gender: Gender::Female,
            activity_level: ActivityLevel::Sedentary,
        };
        assert!(matches!(
            compute_targets(&p, &MacroSplit::default()),
            Err(PlannerError::Validation(_))
        ));
    }
}

use anyhow::Context;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::profile::model::{DietaryPreferences, Profile};

#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub age: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub gender: String,
    pub activity_level: String,
    pub preferred_tags: Vec<String>,
    pub avoided_tags: Vec<String>,
    pub allergens: Vec<String>,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredProfile {
    pub user_id: Uuid,
    pub profile: Profile,
    pub preferences: DietaryPreferences,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ProfileRow> for StoredProfile {
    type Error = anyhow::Error;

    fn try_from(r: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: r.user_id,
            profile: Profile {
                age: u32::try_from(r.age).context("stored age is negative")?,
                weight: r.weight_kg,
                height: r.height_cm,
                gender: r.gender.parse()?,
                activity_level: r.activity_level.parse()?,
            },
            preferences: DietaryPreferences {
                preferred_tags: r.preferred_tags.into_iter().collect(),
                avoided_tags: r.avoided_tags.into_iter().collect(),
                allergens: r.allergens.into_iter().collect(),
            },
            updated_at: r.updated_at,
        })
    }
}

#[cfg(test)]
mod repo_types_tests {
    use super::*;
    use crate::profile::model::{ActivityLevel, Gender};

    fn row() -> ProfileRow {
        ProfileRow {
            user_id: Uuid::new_v4(),
            age: 30,
            weight_kg: 70.0,
            height_cm: 175.0,
            gender: "male".into(),
            activity_level: "very_active".into(),
            preferred_tags: vec!["savory".into()],
            avoided_tags: vec![],
            allergens: vec!["peanut".into()],
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn row_converts_to_domain() {
        let stored = StoredProfile::try_from(row()).unwrap();
        assert_eq!(stored.profile.gender, Gender::Male);
        assert_eq!(stored.profile.activity_level, ActivityLevel::VeryActive);
        assert!(stored.preferences.allergens.contains("peanut"));
    }

    #[test]
    fn corrupt_enum_text_is_an_error() {
        let mut r = row();
        r.activity_level = "couch".into();
        assert!(StoredProfile::try_from(r).is_err());
    }
}

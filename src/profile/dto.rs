use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::profile::model::{DailyTargets, DietaryPreferences, Profile};
use crate::profile::repo_types::StoredProfile;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutProfileRequest {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(flatten)]
    pub preferences: DietaryPreferences,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: Profile,
    pub preferences: DietaryPreferences,
    pub targets: DailyTargets,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProfileResponse {
    pub fn new(stored: StoredProfile, targets: DailyTargets) -> Self {
        Self {
            profile: stored.profile,
            preferences: stored.preferences,
            targets,
            updated_at: stored.updated_at,
        }
    }
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use crate::profile::model::{ActivityLevel, Gender};

    #[test]
    fn put_request_accepts_flat_body_without_preferences() {
        let req: PutProfileRequest = serde_json::from_str(
            r#"{"age": 30, "weight": 70, "height": 175, "gender": "female", "activityLevel": "light"}"#,
        )
        .unwrap();
        assert_eq!(req.profile.gender, Gender::Female);
        assert_eq!(req.profile.activity_level, ActivityLevel::Light);
        assert!(req.preferences.allergens.is_empty());
    }

    #[test]
    fn put_request_reads_preferences() {
        let req: PutProfileRequest = serde_json::from_str(
            r#"{"age": 30, "weight": 70, "height": 175, "gender": "male",
                "activityLevel": "moderate", "allergens": ["peanut"], "preferredTags": ["savory"]}"#,
        )
        .unwrap();
        assert!(req.preferences.allergens.contains("peanut"));
        assert!(req.preferences.preferred_tags.contains("savory"));
    }
}

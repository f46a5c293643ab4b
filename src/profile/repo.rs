use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::profile::model::{DietaryPreferences, Profile};
use crate::profile::repo_types::{ProfileRow, StoredProfile};

pub async fn get(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<StoredProfile>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT user_id, age, weight_kg, height_cm, gender, activity_level,
               preferred_tags, avoided_tags, allergens, updated_at
        FROM profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("select profile")?;
    row.map(StoredProfile::try_from).transpose()
}

pub async fn upsert(
    db: &PgPool,
    user_id: Uuid,
    profile: &Profile,
    prefs: &DietaryPreferences,
) -> anyhow::Result<StoredProfile> {
    let age = i32::try_from(profile.age).context("age out of range")?;
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO profiles (user_id, age, weight_kg, height_cm, gender, activity_level,
                              preferred_tags, avoided_tags, allergens)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (user_id) DO UPDATE
           SET age = EXCLUDED.age,
               weight_kg = EXCLUDED.weight_kg,
               height_cm = EXCLUDED.height_cm,
               gender = EXCLUDED.gender,
               activity_level = EXCLUDED.activity_level,
               preferred_tags = EXCLUDED.preferred_tags,
               avoided_tags = EXCLUDED.avoided_tags,
               allergens = EXCLUDED.allergens,
               updated_at = now()
        RETURNING user_id, age, weight_kg, height_cm, gender, activity_level,
                  preferred_tags, avoided_tags, allergens, updated_at
        "#,
    )
    .bind(user_id)
    .bind(age)
    .bind(profile.weight)
    .bind(profile.height)
    .bind(profile.gender.as_str())
    .bind(profile.activity_level.as_str())
    .bind(prefs.preferred_tags.iter().cloned().collect::<Vec<_>>())
    .bind(prefs.avoided_tags.iter().cloned().collect::<Vec<_>>())
    .bind(prefs.allergens.iter().cloned().collect::<Vec<_>>())
    .fetch_one(db)
    .await
    .context("upsert profile")?;
    StoredProfile::try_from(row)
}

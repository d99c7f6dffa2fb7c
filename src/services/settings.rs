use sqlx::SqlitePool;
use tracing::{error, warn};

use crate::models::Settings;

use super::ServiceError;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SettingsPatch {
    pub site_title: Option<String>,
    pub site_description: Option<String>,
    pub profile_initial: Option<String>,
    pub profile_image_url: Option<String>,
}

impl SettingsPatch {
    fn entries(self) -> Vec<(&'static str, String)> {
        [
            ("site_title", self.site_title),
            ("site_description", self.site_description),
            ("profile_initial", self.profile_initial),
            ("profile_image_url", self.profile_image_url),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect()
    }
}

#[derive(sqlx::FromRow)]
struct SettingRow {
    key: String,
    value: String,
}

/// Stored values layered over the defaults.
pub async fn load(pool: &SqlitePool) -> Result<Settings, ServiceError> {
    let rows = sqlx::query_as::<_, SettingRow>("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await
        .map_err(ServiceError::database("Failed to fetch settings"))?;

    let mut settings = Settings::default();
    for row in rows {
        if !settings.apply(&row.key, row.value) {
            warn!(key = %row.key, "ignoring unknown settings key");
        }
    }

    Ok(settings)
}

/// Settings for the public pages; storage failures fall back to the defaults.
pub async fn load_or_default(pool: &SqlitePool) -> Settings {
    load(pool).await.unwrap_or_else(|err| {
        error!(?err, "failed to load settings, using defaults");
        Settings::default()
    })
}

pub async fn update(pool: &SqlitePool, patch: SettingsPatch) -> Result<Settings, ServiceError> {
    let map_db = || ServiceError::database("Failed to update settings");
    let mut tx = pool.begin().await.map_err(map_db())?;
    for (key, value) in patch.entries() {
        sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .map_err(map_db())?;
    }
    tx.commit().await.map_err(map_db())?;

    load(pool).await
}

//! Website settings repository: a key/value store with JSON values.

use serde::Deserialize;
use serde_json::Value;
use surrealdb::sql::Thing;

use crate::{DbError, get_db};

/// Repository for website settings.
pub struct SettingsRepository;

#[derive(Debug, Deserialize)]
struct SettingRow {
    id: Thing,
    value: Value,
}

impl SettingsRepository {
    /// Fetch all settings as a key/value map.
    pub async fn get_all() -> Result<serde_json::Map<String, Value>, DbError> {
        let db = get_db()?;

        let rows: Vec<SettingRow> = db.select("setting").await?;

        let mut map = serde_json::Map::new();
        for row in rows {
            map.insert(row.id.id.to_raw(), row.value);
        }

        Ok(map)
    }

    /// Upsert a batch of settings.
    pub async fn upsert_many(settings: &serde_json::Map<String, Value>) -> Result<(), DbError> {
        let db = get_db()?;

        for (key, value) in settings {
            db.query("UPSERT type::thing('setting', $key) SET value = $value")
                .bind(("key", key.clone()))
                .bind(("value", value.clone()))
                .await?;
        }

        Ok(())
    }
}

//! Named settings.

use crate::db::{Database, DbResult};
use crate::models::{Setting, FACILITY_NAME_KEY};

/// Typed access to the settings collection.
pub struct SettingService<'a> {
    db: &'a Database,
}

impl<'a> SettingService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get_setting(&self, key: &str) -> DbResult<Option<serde_json::Value>> {
        let setting: Option<Setting> = self.db.get_by_id(&key.to_string())?;
        Ok(setting.map(|s| s.value))
    }

    /// Create or overwrite a setting.
    pub fn save_setting(&self, key: &str, value: serde_json::Value) -> DbResult<()> {
        self.db.put(&Setting::new(key, value))?;
        Ok(())
    }

    /// Saved facility name, if any.
    pub fn facility_name(&self) -> DbResult<Option<String>> {
        Ok(self
            .get_setting(FACILITY_NAME_KEY)?
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|name| !name.is_empty()))
    }

    pub fn save_facility_name(&self, name: &str) -> DbResult<()> {
        self.save_setting(FACILITY_NAME_KEY, serde_json::Value::String(name.trim().to_string()))
    }
}

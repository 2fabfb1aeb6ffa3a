//! Key/value settings.

use serde::{Deserialize, Serialize};

/// Setting key holding the facility name shown in the header.
pub const FACILITY_NAME_KEY: &str = "facilityName";

/// Header text used when no facility name has been saved.
pub const DEFAULT_FACILITY_NAME: &str = "Clinical MS";

/// A single named setting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

//! Store configuration.
//!
//! Resolved once at startup (by the CLI from the environment, by a mobile
//! shell from its own settings) and passed into the core. The core never
//! reads environment variables itself.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Username of the administrator created on first run.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
/// Password of the administrator created on first run.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
/// SHA-256 iterations applied to stored passwords.
pub const DEFAULT_HASH_ROUNDS: u32 = 10_000;
/// Database file used when none is configured.
pub const DEFAULT_DATABASE_FILE: &str = "clinic-records.db";

/// Configuration errors.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for one store.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    database_path: PathBuf,
    default_admin_username: String,
    default_admin_password: String,
    password_hash_rounds: u32,
}

impl StoreConfig {
    /// Create a config with default credentials for the given database file.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            default_admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            default_admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            password_hash_rounds: DEFAULT_HASH_ROUNDS,
        }
    }

    /// Override the first-run administrator credentials.
    pub fn with_default_admin(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let username = username.into();
        let password = password.into();
        if username.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default admin username cannot be empty".into(),
            ));
        }
        if password.is_empty() {
            return Err(ConfigError::Invalid(
                "default admin password cannot be empty".into(),
            ));
        }
        self.default_admin_username = username;
        self.default_admin_password = password;
        Ok(self)
    }

    /// Override the password hash iteration count.
    pub fn with_hash_rounds(mut self, rounds: u32) -> Result<Self, ConfigError> {
        if rounds == 0 {
            return Err(ConfigError::Invalid(
                "password hash rounds must be at least 1".into(),
            ));
        }
        self.password_hash_rounds = rounds;
        Ok(self)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn default_admin_username(&self) -> &str {
        &self.default_admin_username
    }

    pub fn default_admin_password(&self) -> &str {
        &self.default_admin_password
    }

    pub fn password_hash_rounds(&self) -> u32 {
        self.password_hash_rounds
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_FILE)
    }
}

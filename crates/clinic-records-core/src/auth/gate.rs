//! Login checks and first-run administrator bootstrap.

use tracing::{debug, info, warn};

use super::{hash_password, verify_password, AuthError, AuthResult};
use crate::config::StoreConfig;
use crate::db::{Database, UserIndex};
use crate::models::{Role, User};

/// Authentication gate over the user collection.
pub struct Authenticator<'a> {
    db: &'a Database,
    config: &'a StoreConfig,
}

impl<'a> Authenticator<'a> {
    pub fn new(db: &'a Database, config: &'a StoreConfig) -> Self {
        Self { db, config }
    }

    /// Return the user if `password` matches; `None` otherwise.
    ///
    /// A stored hash that cannot be read counts as a mismatch.
    pub fn authenticate(&self, username: &str, password: &str) -> AuthResult<Option<User>> {
        let mut matches: Vec<User> = self.db.get_all_by_index(UserIndex::Username, username)?;
        let Some(user) = matches.pop() else {
            debug!(username, "login rejected: unknown user");
            return Ok(None);
        };

        match verify_password(password, &user.password_hash) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => {
                debug!(username, "login rejected: wrong password");
                Ok(None)
            }
            Err(AuthError::MalformedHash(reason)) => {
                warn!(username, %reason, "login rejected: unreadable password hash");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create the default administrator when no administrator exists.
    ///
    /// Returns the created user, or `None` if an administrator was already
    /// present.
    pub fn ensure_admin_exists(&self) -> AuthResult<Option<User>> {
        let admins: Vec<User> = self
            .db
            .get_all_by_index(UserIndex::Role, Role::Administrator.as_str())?;
        if !admins.is_empty() {
            return Ok(None);
        }

        let mut admin = User::new(
            self.config.default_admin_username().to_string(),
            hash_password(
                self.config.default_admin_password(),
                self.config.password_hash_rounds(),
            ),
            Role::Administrator,
        );
        let id = self.db.add(&admin)?;
        admin.id = Some(id);

        info!(
            user_id = id,
            username = %admin.username,
            "no administrator found; created default administrator"
        );
        Ok(Some(admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::db::DbError;

    fn setup() -> (Database, StoreConfig) {
        let config = StoreConfig::new(":memory:").with_hash_rounds(2).unwrap();
        (Database::open_in_memory().unwrap(), config)
    }

    #[test]
    fn test_first_run_admin_can_log_in() {
        let (db, config) = setup();
        let gate = Authenticator::new(&db, &config);

        let created = gate.ensure_admin_exists().unwrap().unwrap();
        assert_eq!(created.username, "admin");

        let user = gate.authenticate("admin", "admin").unwrap().unwrap();
        assert_eq!(user.role, Role::Administrator);
        assert_eq!(user.id, created.id);
    }

    #[test]
    fn test_ensure_admin_exists_is_idempotent() {
        let (db, config) = setup();
        let gate = Authenticator::new(&db, &config);

        assert!(gate.ensure_admin_exists().unwrap().is_some());
        assert!(gate.ensure_admin_exists().unwrap().is_none());

        let users: Vec<User> = db.get_all().unwrap();
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn test_wrong_password_or_unknown_user_is_no_match() {
        let (db, config) = setup();
        let gate = Authenticator::new(&db, &config);
        gate.ensure_admin_exists().unwrap();

        assert!(gate.authenticate("admin", "wrong").unwrap().is_none());
        assert!(gate.authenticate("nobody", "admin").unwrap().is_none());
    }

    #[test]
    fn test_unreadable_stored_hash_is_no_match() {
        let (db, config) = setup();
        db.add(&User::new("legacy".into(), "admin".into(), Role::Administrator))
            .unwrap();
        db.add(&User::new(
            "old".into(),
            "sha256$1$salt$00".into(),
            Role::Clinician,
        ))
        .unwrap();

        let gate = Authenticator::new(&db, &config);
        assert!(gate.authenticate("legacy", "admin").unwrap().is_none());
        assert!(gate.authenticate("old", "anything").unwrap().is_none());
    }

    #[test]
    fn test_password_not_stored_in_plaintext() {
        let (db, config) = setup();
        let gate = Authenticator::new(&db, &config);
        let admin = gate.ensure_admin_exists().unwrap().unwrap();

        assert_ne!(admin.password_hash, "admin");
        assert!(admin.password_hash.starts_with("pbkdf2-sha256$2$"));
        assert!(!db.export_json().unwrap().contains("\"password\":"));
    }

    #[test]
    fn test_configured_default_admin() {
        let db = Database::open_in_memory().unwrap();
        let config = StoreConfig::new(":memory:")
            .with_default_admin("root", "changeme")
            .unwrap()
            .with_hash_rounds(1)
            .unwrap();
        let gate = Authenticator::new(&db, &config);
        gate.ensure_admin_exists().unwrap();

        assert!(gate.authenticate("root", "changeme").unwrap().is_some());
        assert!(gate.authenticate("admin", "admin").unwrap().is_none());
    }

    #[test]
    fn test_bootstrap_username_taken_by_non_admin() {
        let (db, config) = setup();
        db.add(&User::new(
            "admin".into(),
            hash_password("x", 1),
            Role::Clinician,
        ))
        .unwrap();

        let gate = Authenticator::new(&db, &config);
        assert!(matches!(
            gate.ensure_admin_exists(),
            Err(AuthError::Database(DbError::Constraint(_)))
        ));
    }
}

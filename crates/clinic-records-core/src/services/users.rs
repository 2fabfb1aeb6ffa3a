//! Local user accounts.

use crate::auth::hash_password;
use crate::config::StoreConfig;
use crate::db::{Database, DbResult};
use crate::models::{Role, User};

/// Typed access to the user collection.
pub struct UserService<'a> {
    db: &'a Database,
    config: &'a StoreConfig,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a Database, config: &'a StoreConfig) -> Self {
        Self { db, config }
    }

    /// Create an account; the password is stored as a salted hash.
    pub fn create_user(&self, username: &str, password: &str, role: Role) -> DbResult<User> {
        let mut user = User::new(
            username.to_string(),
            hash_password(password, self.config.password_hash_rounds()),
            role,
        );
        user.id = Some(self.db.add(&user)?);
        Ok(user)
    }

    pub fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        self.db.get_by_id(&id)
    }

    pub fn list_users(&self) -> DbResult<Vec<User>> {
        self.db.get_all()
    }

    /// Delete an account. Returns whether it existed.
    pub fn delete_user(&self, id: i64) -> DbResult<bool> {
        self.db.delete_by_id::<User>(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{verify_password, Authenticator};
    use crate::db::DbError;

    fn config() -> StoreConfig {
        StoreConfig::new(":memory:").with_hash_rounds(1).unwrap()
    }

    #[test]
    fn test_create_and_log_in() {
        let db = Database::open_in_memory().unwrap();
        let config = config();
        let users = UserService::new(&db, &config);

        let clerk = users
            .create_user("clerk", "pass1", Role::RecordsClerk)
            .unwrap();
        assert!(verify_password("pass1", &clerk.password_hash).unwrap());

        let gate = Authenticator::new(&db, &config);
        let user = gate.authenticate("clerk", "pass1").unwrap().unwrap();
        assert_eq!(user.role, Role::RecordsClerk);
    }

    #[test]
    fn test_duplicate_username() {
        let db = Database::open_in_memory().unwrap();
        let config = config();
        let users = UserService::new(&db, &config);

        users.create_user("nurse", "a", Role::Clinician).unwrap();
        assert!(matches!(
            users.create_user("nurse", "b", Role::RecordsClerk),
            Err(DbError::Constraint(_))
        ));
    }

    #[test]
    fn test_bootstrap_admin_survives_other_admins() {
        let db = Database::open_in_memory().unwrap();
        let config = config();
        let bootstrap = Authenticator::new(&db, &config)
            .ensure_admin_exists()
            .unwrap()
            .unwrap();
        let users = UserService::new(&db, &config);
        let second = users
            .create_user("admin2", "x", Role::Administrator)
            .unwrap();

        assert!(matches!(
            users.delete_user(bootstrap.id.unwrap()),
            Err(DbError::ProtectedRecord(_))
        ));
        assert!(users.delete_user(second.id.unwrap()).unwrap());
        assert_eq!(users.list_users().unwrap().len(), 1);
    }
}

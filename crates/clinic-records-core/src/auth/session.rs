//! Ephemeral login session.

use serde::{Deserialize, Serialize};

use crate::models::{Action, Role, User};

/// The authenticated user as seen by a front end. Never carries the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl Session {
    /// Build a session for a stored user; `None` if the user has no id yet.
    pub fn for_user(user: &User) -> Option<Self> {
        Some(Self {
            user_id: user.id?,
            username: user.username.clone(),
            role: user.role,
        })
    }

    pub fn permits(&self, action: Action) -> bool {
        self.role.permits(action)
    }
}

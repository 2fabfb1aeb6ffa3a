//! User account and role models.

use serde::{Deserialize, Serialize};

/// Fixed set of roles a local account can hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    /// Full access
    #[serde(rename = "administrator", alias = "admin")]
    Administrator,
    /// Registers and updates patients
    #[serde(rename = "records-clerk", alias = "records")]
    RecordsClerk,
    /// Records consultations
    #[serde(rename = "clinician")]
    Clinician,
}

/// Front-end actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RegisterPatient,
    UpdatePatient,
    RecordConsultation,
    ExportPatients,
    ManageUsers,
    ManageSettings,
    BackupData,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::RecordsClerk, Role::Clinician];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::RecordsClerk => "records-clerk",
            Role::Clinician => "clinician",
        }
    }

    /// Parse a role name; accepts the legacy short names too.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "administrator" | "admin" => Some(Role::Administrator),
            "records-clerk" | "records" => Some(Role::RecordsClerk),
            "clinician" => Some(Role::Clinician),
            _ => None,
        }
    }

    /// Whether this role may perform `action`.
    pub fn permits(&self, action: Action) -> bool {
        match self {
            Role::Administrator => true,
            Role::RecordsClerk => matches!(
                action,
                Action::RegisterPatient | Action::UpdatePatient | Action::ExportPatients
            ),
            Role::Clinician => matches!(action, Action::RecordConsultation),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Login name (unique)
    pub username: String,
    /// Encoded salted hash, see [`crate::auth::hash_password`]
    pub password_hash: String,
    pub role: Role,
    /// Creation timestamp; empty for accounts restored from old backups
    #[serde(default)]
    pub created_at: String,
}

impl User {
    /// Create a user from an already-encoded password hash.
    pub fn new(username: String, password_hash: String, role: Role) -> Self {
        Self {
            id: None,
            username,
            password_hash,
            role,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }
}

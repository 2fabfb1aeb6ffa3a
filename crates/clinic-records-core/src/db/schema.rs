//! SQLite schema definition.

/// Schema version stamped into `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 2;

/// Complete database schema for clinic records.
///
/// Every collection table stores the full record as a JSON `body`, next to
/// the key column and the columns its secondary indexes need.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    registration_number TEXT NOT NULL,
    body TEXT NOT NULL,                          -- JSON Patient
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_patients_registration_number
    ON patients(registration_number);

-- ============================================================================
-- Visits (append-only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL,                 -- not a foreign key: may outlive its patient after import
    body TEXT NOT NULL,                          -- JSON Visit
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_visits_patient_id ON visits(patient_id);

-- ============================================================================
-- Users
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('administrator', 'records-clerk', 'clinician')),
    body TEXT NOT NULL,                          -- JSON User
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users(username);
CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

-- ============================================================================
-- Settings (keyed by name)
-- ============================================================================

CREATE TABLE IF NOT EXISTS settings (
    key TEXT NOT NULL PRIMARY KEY,
    body TEXT NOT NULL,                          -- JSON Setting
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Store metadata (never exported)
-- ============================================================================

CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT NOT NULL PRIMARY KEY,
    value INTEGER NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

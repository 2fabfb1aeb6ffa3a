//! Whole-store export and import.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::store::{clear_collection, insert_record, select_records};
use super::{bootstrap, Database, DbError, DbResult, Record};
use crate::models::{Patient, Role, Setting, User, Visit};

/// Point-in-time copy of the collections.
///
/// A collection that is `None` is absent: export always fills all four,
/// import leaves absent collections untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patients: Option<Vec<Patient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visits: Option<Vec<Visit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Vec<Setting>>,
}

impl Snapshot {
    /// Export to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse an export document.
    pub fn from_json(json: &str) -> DbResult<Self> {
        serde_json::from_str(json).map_err(malformed)
    }

    /// Parse an export document that may hold plaintext `password` fields on
    /// user records, as written by the browser front end. Each one is
    /// replaced by `hash(password)` in `passwordHash` before parsing.
    pub fn from_json_hashing_passwords(
        json: &str,
        hash: impl Fn(&str) -> String,
    ) -> DbResult<Self> {
        let mut doc: serde_json::Value = serde_json::from_str(json).map_err(malformed)?;
        let users = doc
            .get_mut("users")
            .and_then(serde_json::Value::as_array_mut)
            .into_iter()
            .flatten()
            .filter_map(serde_json::Value::as_object_mut);
        for user in users {
            let password = user.remove("password");
            if user.contains_key("passwordHash") {
                continue;
            }
            if let Some(serde_json::Value::String(password)) = password {
                user.insert("passwordHash".into(), hash(&password).into());
            }
        }
        serde_json::from_value(doc).map_err(malformed)
    }
}

/// Records written per collection by an import; `None` means untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub patients: Option<usize>,
    pub visits: Option<usize>,
    pub users: Option<usize>,
    pub settings: Option<usize>,
}

impl Database {
    /// Read all four collections inside one transaction.
    pub fn export_all(&self) -> DbResult<Snapshot> {
        let tx = self.conn.unchecked_transaction()?;
        let snapshot = Snapshot {
            patients: Some(select_records::<Patient, _>(&tx, "", params![])?),
            visits: Some(select_records::<Visit, _>(&tx, "", params![])?),
            users: Some(select_records::<User, _>(&tx, "", params![])?),
            settings: Some(select_records::<Setting, _>(&tx, "", params![])?),
        };
        tx.commit()?;
        Ok(snapshot)
    }

    /// Export all collections as pretty JSON.
    pub fn export_json(&self) -> DbResult<String> {
        Ok(self.export_all()?.to_json()?)
    }

    /// Replace every collection present in `snapshot`, all or nothing.
    ///
    /// Any failure rolls back the whole import and is reported as
    /// [`DbError::ImportFailed`].
    pub fn import_all(&mut self, snapshot: &Snapshot) -> DbResult<ImportSummary> {
        if let Some(users) = &snapshot.users {
            if !users.iter().any(User::is_administrator) {
                return Err(DbError::ImportFailed(
                    "backup users include no administrator".into(),
                ));
            }
        }

        let tx = self.transaction().map_err(import_failed)?;
        let summary = apply_snapshot(&tx, snapshot).map_err(import_failed)?;
        tx.commit().map_err(|e| import_failed(e.into()))?;

        info!(
            patients = ?summary.patients,
            visits = ?summary.visits,
            users = ?summary.users,
            settings = ?summary.settings,
            "imported backup"
        );
        Ok(summary)
    }

    /// Parse and import a JSON export document.
    pub fn import_json(&mut self, json: &str) -> DbResult<ImportSummary> {
        let snapshot = Snapshot::from_json(json)?;
        self.import_all(&snapshot)
    }
}

fn apply_snapshot(conn: &Connection, snapshot: &Snapshot) -> DbResult<ImportSummary> {
    let summary = ImportSummary {
        patients: replace_collection(conn, snapshot.patients.as_deref())?,
        visits: replace_collection(conn, snapshot.visits.as_deref())?,
        users: replace_collection(conn, snapshot.users.as_deref())?,
        settings: replace_collection(conn, snapshot.settings.as_deref())?,
    };
    if snapshot.users.is_some() {
        reconcile_bootstrap(conn)?;
    }
    Ok(summary)
}

fn replace_collection<R: Record>(conn: &Connection, records: Option<&[R]>) -> DbResult<Option<usize>> {
    let Some(records) = records else {
        return Ok(None);
    };
    clear_collection(conn, R::COLLECTION)?;
    for record in records {
        insert_record(conn, record, false).map_err(|e| {
            DbError::ImportFailed(format!("{}: {}", R::COLLECTION.name(), e))
        })?;
    }
    Ok(Some(records.len()))
}

/// Keep the bootstrap marker on an imported administrator.
fn reconcile_bootstrap(conn: &Connection) -> DbResult<()> {
    let admins: Vec<User> = select_records(
        conn,
        "WHERE role = ?1",
        params![Role::Administrator.as_str()],
    )?;
    let current = bootstrap::read(conn)?;
    if current.is_some() && admins.iter().any(|u| u.id == current) {
        return Ok(());
    }
    match admins.iter().filter_map(|u| u.id).min() {
        Some(id) => bootstrap::set(conn, id),
        None => Err(DbError::ImportFailed(
            "backup users include no administrator".into(),
        )),
    }
}

fn malformed(e: serde_json::Error) -> DbError {
    DbError::ImportFailed(format!("malformed backup document: {}", e))
}

fn import_failed(e: DbError) -> DbError {
    match e {
        DbError::ImportFailed(_) => e,
        other => DbError::ImportFailed(other.to_string()),
    }
}

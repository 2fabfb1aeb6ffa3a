//! Collection-agnostic record storage.
//!
//! Each entity implements [`Record`], which names its collection, its key
//! type and its secondary indexes. The operations on [`Database`] here are the
//! only code that reads or writes collection tables.

use rusqlite::types::{FromSql, ToSql, Value};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Params};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::bootstrap;
use super::{Database, DbError, DbResult};

/// The four record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Patients,
    Visits,
    Users,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Patients,
        Collection::Visits,
        Collection::Users,
        Collection::Settings,
    ];

    /// Collection name, used as table name and snapshot key.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::Visits => "visits",
            Collection::Users => "users",
            Collection::Settings => "settings",
        }
    }

    pub fn key_column(&self) -> &'static str {
        match self {
            Collection::Settings => "key",
            _ => "id",
        }
    }
}

/// Primary key of a record.
pub trait RecordKey: ToSql + FromSql + Clone + std::fmt::Debug {
    /// Whether the store assigns this key when a record has none.
    const AUTO_ASSIGNED: bool;

    fn from_rowid(rowid: i64) -> Option<Self>;

    fn to_value(&self) -> Value;
}

impl RecordKey for i64 {
    const AUTO_ASSIGNED: bool = true;

    fn from_rowid(rowid: i64) -> Option<Self> {
        Some(rowid)
    }

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl RecordKey for String {
    const AUTO_ASSIGNED: bool = false;

    fn from_rowid(_rowid: i64) -> Option<Self> {
        None
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

/// A secondary index column.
pub trait IndexColumn: Copy {
    fn column(self) -> &'static str;
}

/// Index type for collections without secondary indexes.
#[derive(Debug, Clone, Copy)]
pub enum NoIndex {}

impl IndexColumn for NoIndex {
    fn column(self) -> &'static str {
        match self {}
    }
}

/// A storable record.
pub trait Record: Serialize + DeserializeOwned + Clone {
    type Key: RecordKey;
    type Index: IndexColumn;

    const COLLECTION: Collection;

    fn key(&self) -> Option<Self::Key>;

    fn set_key(&mut self, key: Self::Key);

    /// Values of every secondary index column for this record.
    fn index_values(&self) -> Vec<(Self::Index, Value)>;

    /// Whether storing this record may make it the protected bootstrap
    /// administrator.
    fn is_bootstrap_candidate(&self) -> bool {
        false
    }
}

impl Database {
    /// Insert a new record, assigning a key if it has none.
    pub fn add<R: Record>(&self, record: &R) -> DbResult<R::Key> {
        let key = insert_record(&self.conn, record, false)?;
        self.note_bootstrap_candidate(record, &key)?;
        Ok(key)
    }

    /// Get a record by key.
    pub fn get_by_id<R: Record>(&self, key: &R::Key) -> DbResult<Option<R>> {
        let filter = format!("WHERE {} = ?1", R::COLLECTION.key_column());
        let records = select_records::<R, _>(&self.conn, &filter, params![key])?;
        Ok(records.into_iter().next())
    }

    /// Insert or replace a record by key.
    pub fn put<R: Record>(&self, record: &R) -> DbResult<R::Key> {
        if R::COLLECTION == Collection::Users && !record.is_bootstrap_candidate() {
            if let Some(key) = record.key() {
                if self.is_bootstrap_key(&key)? {
                    return Err(DbError::ProtectedRecord(
                        "the bootstrap administrator must keep the administrator role".into(),
                    ));
                }
            }
        }
        let key = insert_record(&self.conn, record, true)?;
        self.note_bootstrap_candidate(record, &key)?;
        Ok(key)
    }

    /// Delete a record by key. Returns whether it existed.
    pub fn delete_by_id<R: Record>(&self, key: &R::Key) -> DbResult<bool> {
        if R::COLLECTION == Collection::Users && self.is_bootstrap_key(key)? {
            warn!(user_id = ?key, "refused to delete the bootstrap administrator");
            return Err(DbError::ProtectedRecord(
                "the bootstrap administrator cannot be deleted".into(),
            ));
        }
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            R::COLLECTION.name(),
            R::COLLECTION.key_column()
        );
        let rows_affected = self.conn.execute(&sql, params![key])?;
        Ok(rows_affected > 0)
    }

    /// List every record in key order.
    pub fn get_all<R: Record>(&self) -> DbResult<Vec<R>> {
        select_records::<R, _>(&self.conn, "", params![])
    }

    /// List records whose indexed column equals `value`, in key order.
    pub fn get_all_by_index<R: Record>(
        &self,
        index: R::Index,
        value: impl ToSql,
    ) -> DbResult<Vec<R>> {
        let filter = format!("WHERE {} = ?1", index.column());
        select_records::<R, _>(&self.conn, &filter, params![value])
    }

    /// Id of the protected bootstrap administrator, if one was ever stored.
    pub fn bootstrap_admin_id(&self) -> DbResult<Option<i64>> {
        bootstrap::read(&self.conn)
    }

    fn is_bootstrap_key<K: RecordKey>(&self, key: &K) -> DbResult<bool> {
        Ok(match (self.bootstrap_admin_id()?, key.to_value()) {
            (Some(bootstrap_id), Value::Integer(id)) => bootstrap_id == id,
            _ => false,
        })
    }

    fn note_bootstrap_candidate<R: Record>(&self, record: &R, key: &R::Key) -> DbResult<()> {
        if R::COLLECTION != Collection::Users || !record.is_bootstrap_candidate() {
            return Ok(());
        }
        if let Value::Integer(id) = key.to_value() {
            bootstrap::claim_if_unset(&self.conn, id)?;
        }
        Ok(())
    }
}

/// Insert a record; with `upsert`, replace any existing record with its key.
pub(crate) fn insert_record<R: Record>(
    conn: &Connection,
    record: &R,
    upsert: bool,
) -> DbResult<R::Key> {
    let collection = R::COLLECTION;
    let key = record.key();
    if key.is_none() && !R::Key::AUTO_ASSIGNED {
        return Err(DbError::Constraint(format!(
            "{} records need an explicit {}",
            collection.name(),
            collection.key_column()
        )));
    }

    let mut columns: Vec<&'static str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(key) = &key {
        columns.push(collection.key_column());
        values.push(key.to_value());
    }
    for (index, value) in record.index_values() {
        columns.push(index.column());
        values.push(value);
    }
    columns.push("body");
    values.push(Value::Text(serde_json::to_string(record)?));

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        collection.name(),
        columns.join(", "),
        placeholders.join(", ")
    );
    if upsert && key.is_some() {
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| **c != collection.key_column())
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();
        sql.push_str(&format!(
            " ON CONFLICT({}) DO UPDATE SET {}, updated_at = datetime('now')",
            collection.key_column(),
            updates.join(", ")
        ));
    }

    conn.execute(&sql, params_from_iter(values))
        .map_err(constraint_error)?;

    match key {
        Some(key) => Ok(key),
        None => R::Key::from_rowid(conn.last_insert_rowid()).ok_or_else(|| {
            DbError::Constraint(format!("{} key was not assigned", collection.name()))
        }),
    }
}

/// Select records of one collection with an optional `WHERE` clause.
pub(crate) fn select_records<R: Record, P: Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> DbResult<Vec<R>> {
    let collection = R::COLLECTION;
    let sql = format!(
        "SELECT {key}, body FROM {table} {filter} ORDER BY {key}",
        key = collection.key_column(),
        table = collection.name(),
        filter = filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok((row.get::<_, R::Key>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (key, body) = row?;
        let mut record: R = serde_json::from_str(&body)?;
        record.set_key(key);
        records.push(record);
    }
    Ok(records)
}

/// Delete every record of one collection.
pub(crate) fn clear_collection(conn: &Connection, collection: Collection) -> DbResult<usize> {
    Ok(conn.execute(&format!("DELETE FROM {}", collection.name()), [])?)
}

fn constraint_error(e: rusqlite::Error) -> DbError {
    match &e {
        rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
            DbError::Constraint(msg.clone().unwrap_or_else(|| err.to_string()))
        }
        _ => DbError::Sqlite(e),
    }
}

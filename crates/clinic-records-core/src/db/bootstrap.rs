//! Bootstrap administrator marker.
//!
//! The first administrator ever stored is remembered in `store_meta` so it
//! can be protected from deletion. The marker is not part of snapshots.

use rusqlite::{Connection, OptionalExtension};

use super::DbResult;

const BOOTSTRAP_ADMIN_KEY: &str = "bootstrap_admin_id";

pub(crate) fn read(conn: &Connection) -> DbResult<Option<i64>> {
    conn.query_row(
        "SELECT value FROM store_meta WHERE key = ?",
        [BOOTSTRAP_ADMIN_KEY],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

/// Record `id` unless a bootstrap administrator is already recorded.
pub(crate) fn claim_if_unset(conn: &Connection, id: i64) -> DbResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO store_meta (key, value) VALUES (?1, ?2)",
        rusqlite::params![BOOTSTRAP_ADMIN_KEY, id],
    )?;
    Ok(())
}

/// Point the marker at `id`.
pub(crate) fn set(conn: &Connection, id: i64) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO store_meta (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')
        "#,
        rusqlite::params![BOOTSTRAP_ADMIN_KEY, id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SCHEMA;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn
    }

    #[test]
    fn test_claim_only_once() {
        let conn = setup_conn();
        assert_eq!(read(&conn).unwrap(), None);

        claim_if_unset(&conn, 3).unwrap();
        claim_if_unset(&conn, 5).unwrap();
        assert_eq!(read(&conn).unwrap(), Some(3));
    }

    #[test]
    fn test_set_overrides() {
        let conn = setup_conn();
        claim_if_unset(&conn, 3).unwrap();
        set(&conn, 9).unwrap();
        assert_eq!(read(&conn).unwrap(), Some(9));
    }
}

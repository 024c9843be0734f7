//! Messenger profile cache query functions.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Insert or replace a cached profile (stored as its canonical JSON encoding).
pub fn put(conn: &Connection, fingerprint: &str, profile_json: &str, fetched_at: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO messenger_profiles (fingerprint, profile_json, fetched_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(fingerprint) DO UPDATE SET profile_json = excluded.profile_json,
            fetched_at = excluded.fetched_at",
        rusqlite::params![fingerprint, profile_json, fetched_at as i64],
    )?;
    Ok(())
}

/// Fetch a cached profile, if present.
pub fn get(conn: &Connection, fingerprint: &str) -> Result<Option<CachedProfileRow>> {
    let result = conn.query_row(
        "SELECT profile_json, fetched_at FROM messenger_profiles WHERE fingerprint = ?1",
        [fingerprint],
        |row| {
            Ok(CachedProfileRow {
                profile_json: row.get(0)?,
                fetched_at: row.get::<_, i64>(1)? as u64,
            })
        },
    );
    match result {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

pub fn invalidate(conn: &Connection, fingerprint: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM messenger_profiles WHERE fingerprint = ?1",
        [fingerprint],
    )?;
    Ok(())
}

pub fn set_name(conn: &Connection, fingerprint: &str, name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO messenger_name_cache (fingerprint, name) VALUES (?1, ?2)
         ON CONFLICT(fingerprint) DO UPDATE SET name = excluded.name",
        rusqlite::params![fingerprint, name],
    )?;
    Ok(())
}

pub fn get_name(conn: &Connection, fingerprint: &str) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT name FROM messenger_name_cache WHERE fingerprint = ?1",
        [fingerprint],
        |row| row.get::<_, String>(0),
    );
    match result {
        Ok(name) => Ok(Some(name)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

#[derive(Debug, Clone)]
pub struct CachedProfileRow {
    pub profile_json: String,
    pub fetched_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    const FP_A: &str = "aa11223344556677889900aabbccddeeff00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff00112233445566778899aabb";

    #[test]
    fn test_put_get_invalidate() {
        let conn = test_db();
        assert!(get(&conn, FP_A).expect("get").is_none());

        put(&conn, FP_A, "{\"display_name\":\"Alice\"}", 1_000).expect("put");
        let cached = get(&conn, FP_A).expect("get").expect("present");
        assert_eq!(cached.fetched_at, 1_000);

        invalidate(&conn, FP_A).expect("invalidate");
        assert!(get(&conn, FP_A).expect("get").is_none());
    }

    #[test]
    fn test_name_cache() {
        let conn = test_db();
        assert!(get_name(&conn, FP_A).expect("get").is_none());
        set_name(&conn, FP_A, "nocdem").expect("set");
        assert_eq!(get_name(&conn, FP_A).expect("get").as_deref(), Some("nocdem"));
        set_name(&conn, FP_A, "nocdem2").expect("update");
        assert_eq!(get_name(&conn, FP_A).expect("get").as_deref(), Some("nocdem2"));
    }
}

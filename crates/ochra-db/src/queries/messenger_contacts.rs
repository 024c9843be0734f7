//! Messenger contact query functions.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Insert a new messenger contact. Fails with `DbError::Constraint` if
/// `fingerprint` is already present (the primary key is the fingerprint).
pub fn insert(conn: &Connection, fingerprint: &str, notes: Option<&str>, added_at: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO messenger_contacts (fingerprint, notes, added_at, is_blocked)
         VALUES (?1, ?2, ?3, 0)",
        rusqlite::params![fingerprint, notes, added_at as i64],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref se, _)
            if se.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(format!("contact {fingerprint} already exists"))
        }
        other => DbError::Sqlite(other),
    })?;
    Ok(())
}

/// Get a contact by fingerprint.
pub fn get(conn: &Connection, fingerprint: &str) -> Result<ContactRow> {
    conn.query_row(
        "SELECT fingerprint, notes, added_at, is_blocked FROM messenger_contacts WHERE fingerprint = ?1",
        [fingerprint],
        |row| {
            Ok(ContactRow {
                fingerprint: row.get(0)?,
                notes: row.get(1)?,
                added_at: row.get::<_, i64>(2)? as u64,
                is_blocked: row.get(3)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("messenger contact".into()),
        other => DbError::Sqlite(other),
    })
}

/// List all contacts.
pub fn list(conn: &Connection) -> Result<Vec<ContactRow>> {
    let mut stmt = conn.prepare(
        "SELECT fingerprint, notes, added_at, is_blocked FROM messenger_contacts ORDER BY added_at",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ContactRow {
                fingerprint: row.get(0)?,
                notes: row.get(1)?,
                added_at: row.get::<_, i64>(2)? as u64,
                is_blocked: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn remove(conn: &Connection, fingerprint: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM messenger_contacts WHERE fingerprint = ?1",
        [fingerprint],
    )?;
    Ok(())
}

pub fn set_blocked(conn: &Connection, fingerprint: &str, blocked: bool) -> Result<()> {
    conn.execute(
        "UPDATE messenger_contacts SET is_blocked = ?2 WHERE fingerprint = ?1",
        rusqlite::params![fingerprint, blocked],
    )?;
    Ok(())
}

pub fn exists(conn: &Connection, fingerprint: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messenger_contacts WHERE fingerprint = ?1",
        [fingerprint],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Insert or update a pending contact request.
pub fn upsert_pending_request(
    conn: &Connection,
    sender_fp: &str,
    sender_name: Option<&str>,
    message: Option<&str>,
    received_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO messenger_pending_requests (sender_fp, sender_name, message, received_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(sender_fp) DO UPDATE SET sender_name = excluded.sender_name,
            message = excluded.message, received_at = excluded.received_at",
        rusqlite::params![sender_fp, sender_name, message, received_at as i64],
    )?;
    Ok(())
}

pub fn list_pending_requests(conn: &Connection) -> Result<Vec<PendingRequestRow>> {
    let mut stmt = conn.prepare(
        "SELECT sender_fp, sender_name, message, received_at FROM messenger_pending_requests
         ORDER BY received_at",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingRequestRow {
                sender_fp: row.get(0)?,
                sender_name: row.get(1)?,
                message: row.get(2)?,
                received_at: row.get::<_, i64>(3)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn remove_pending_request(conn: &Connection, sender_fp: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM messenger_pending_requests WHERE sender_fp = ?1",
        [sender_fp],
    )?;
    Ok(())
}

/// A raw messenger contact row.
#[derive(Debug, Clone)]
pub struct ContactRow {
    pub fingerprint: String,
    pub notes: Option<String>,
    pub added_at: u64,
    pub is_blocked: bool,
}

/// A raw pending contact request row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PendingRequestRow {
    pub sender_fp: String,
    pub sender_name: Option<String>,
    pub message: Option<String>,
    pub received_at: u64,
}

//! Messenger outbound/inbound message store query functions.

use rusqlite::Connection;

use crate::Result;

/// Direction of a stored message, relative to the local identity.
pub const DIRECTION_OUTBOUND: &str = "outbound";
pub const DIRECTION_INBOUND: &str = "inbound";

/// Delivery status of a stored message.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_SENT: &str = "sent";
pub const STATUS_FAILED: &str = "failed";
pub const STATUS_DELIVERED: &str = "delivered";
pub const STATUS_READ: &str = "read";

/// Record a newly queued outbound message at `status = pending`.
pub fn insert_outbound(
    conn: &Connection,
    recipient_fp: &str,
    seq: u64,
    plaintext: &[u8],
    queued_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO messenger_messages (recipient_fp, seq, direction, plaintext, status, queued_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            recipient_fp,
            seq as i64,
            DIRECTION_OUTBOUND,
            plaintext,
            STATUS_PENDING,
            queued_at as i64,
        ],
    )?;
    Ok(())
}

/// Record a received inbound message, already decrypted. Returns `false`
/// without error if `(sender_fp, seq)` was already recorded (the
/// `(recipient_fp, seq, direction)` primary key makes re-delivery a no-op).
pub fn insert_inbound(
    conn: &Connection,
    sender_fp: &str,
    seq: u64,
    plaintext: &[u8],
    received_at: u64,
) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO messenger_messages (recipient_fp, seq, direction, plaintext, status, queued_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            sender_fp,
            seq as i64,
            DIRECTION_INBOUND,
            plaintext,
            STATUS_DELIVERED,
            received_at as i64,
        ],
    )?;
    Ok(changed > 0)
}

/// Set the status of a single outbound message by recipient+seq.
pub fn set_status(conn: &Connection, recipient_fp: &str, seq: u64, status: &str) -> Result<()> {
    conn.execute(
        "UPDATE messenger_messages SET status = ?3
         WHERE recipient_fp = ?1 AND seq = ?2 AND direction = 'outbound'",
        rusqlite::params![recipient_fp, seq as i64, status],
    )?;
    Ok(())
}

/// Bulk-mark every outbound message to `recipient_fp` with `seq <= watermark`
/// as delivered, unless already at a later status (read).
pub fn mark_delivered_up_to(conn: &Connection, recipient_fp: &str, watermark: u64) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE messenger_messages SET status = ?3
         WHERE recipient_fp = ?1 AND direction = 'outbound' AND seq <= ?2
           AND status NOT IN (?3, 'read')",
        rusqlite::params![recipient_fp, watermark as i64, STATUS_DELIVERED],
    )?;
    Ok(changed)
}

/// List the full conversation with `peer_fp`, ordered by sequence.
pub fn list_conversation(conn: &Connection, peer_fp: &str) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT recipient_fp, seq, direction, plaintext, status, queued_at
         FROM messenger_messages WHERE recipient_fp = ?1 ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([peer_fp], |row| {
            Ok(MessageRow {
                peer_fp: row.get(0)?,
                seq: row.get::<_, i64>(1)? as u64,
                direction: row.get(2)?,
                plaintext: row.get(3)?,
                status: row.get(4)?,
                queued_at: row.get::<_, i64>(5)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Next outbound sequence number for `recipient_fp` (1 if none sent yet).
pub fn next_outbound_seq(conn: &Connection, recipient_fp: &str) -> Result<u64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(seq) FROM messenger_messages WHERE recipient_fp = ?1 AND direction = 'outbound'",
        [recipient_fp],
        |row| row.get(0),
    )?;
    Ok(max.map(|v| v as u64 + 1).unwrap_or(1))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MessageRow {
    pub peer_fp: String,
    pub seq: u64,
    pub direction: String,
    pub plaintext: Vec<u8>,
    pub status: String,
    pub queued_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    const BOB: &str = "bb11223344556677889900aabbccddeeff00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff00112233445566778899aabb";

    #[test]
    fn test_insert_inbound_dedups_same_seq() {
        let conn = test_db();
        assert!(insert_inbound(&conn, BOB, 1, b"hi", 100).expect("first insert"));
        assert!(!insert_inbound(&conn, BOB, 1, b"hi again", 200).expect("duplicate insert"));
        assert_eq!(list_conversation(&conn, BOB).expect("list").len(), 1);
    }

    #[test]
    fn test_seq_allocation() {
        let conn = test_db();
        assert_eq!(next_outbound_seq(&conn, BOB).expect("seq"), 1);
        insert_outbound(&conn, BOB, 1, b"hi", 100).expect("insert");
        assert_eq!(next_outbound_seq(&conn, BOB).expect("seq"), 2);
    }

    #[test]
    fn test_bulk_watermark_delivery() {
        let conn = test_db();
        for seq in 1..=5u64 {
            insert_outbound(&conn, BOB, seq, b"msg", 100 + seq).expect("insert");
            set_status(&conn, BOB, seq, STATUS_SENT).expect("mark sent");
        }

        let changed = mark_delivered_up_to(&conn, BOB, 4).expect("bulk update");
        assert_eq!(changed, 4);

        let convo = list_conversation(&conn, BOB).expect("list");
        assert_eq!(convo[0].status, STATUS_DELIVERED);
        assert_eq!(convo[3].status, STATUS_DELIVERED);
        assert_eq!(convo[4].status, STATUS_SENT);
    }

    #[test]
    fn test_read_not_downgraded() {
        let conn = test_db();
        insert_outbound(&conn, BOB, 1, b"msg", 100).expect("insert");
        set_status(&conn, BOB, 1, STATUS_READ).expect("mark read");
        mark_delivered_up_to(&conn, BOB, 1).expect("bulk update");
        let convo = list_conversation(&conn, BOB).expect("list");
        assert_eq!(convo[0].status, STATUS_READ);
    }
}

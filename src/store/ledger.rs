//! Append-only change ledger.
//!
//! Discrete card-level change events, written once and never updated, so
//! "what changed and when" is answerable without reconstructing deltas from
//! the temporal tables.

use crate::diff::ChangeKind;
use crate::error::Result;
use crate::store::{parse_ts, ts};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ToSql};
use serde_json::Value;
use tracing::warn;

/// One recorded change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: i64,
    pub board_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: ChangeKind,
    pub card_id: String,
    /// Serialized change detail (the changeset record the event came from)
    pub details: Value,
}

/// Append one entry. Entries are never updated or deleted afterwards.
pub(crate) fn append_entry(
    conn: &Connection,
    board_id: &str,
    timestamp_str: &str,
    kind: ChangeKind,
    card_id: &str,
    details_json: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO changes (board_id, timestamp, change_type, card_id, details) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![board_id, timestamp_str, kind.as_str(), card_id, details_json],
    )?;
    Ok(())
}

/// Query ledger entries for a board, newest first.
///
/// Rows with an unreadable kind or timestamp are skipped with a warning
/// rather than failing the whole query; history stays usable even when
/// individual rows are damaged.
pub(crate) fn query_history(
    conn: &Connection,
    board_id: &str,
    since: Option<DateTime<Utc>>,
    card_id: Option<&str>,
    limit: usize,
) -> Result<Vec<LedgerEntry>> {
    let board_param = board_id.to_string();
    let since_param = since.map(ts);
    let card_param = card_id.map(str::to_string);

    let mut sql = String::from(
        "SELECT id, timestamp, change_type, card_id, details \
         FROM changes WHERE board_id = ?1",
    );
    let mut sql_params: Vec<&dyn ToSql> = vec![&board_param];
    if let Some(ref since_str) = since_param {
        sql.push_str(&format!(" AND timestamp >= ?{}", sql_params.len() + 1));
        sql_params.push(since_str);
    }
    if let Some(ref card) = card_param {
        sql.push_str(&format!(" AND card_id = ?{}", sql_params.len() + 1));
        sql_params.push(card);
    }
    sql.push_str(" ORDER BY timestamp DESC, id DESC");
    sql.push_str(&format!(" LIMIT {limit}"));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(sql_params.as_slice(), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, timestamp, change_type, card, details) = row?;
        let Ok(kind) = change_type.parse::<ChangeKind>() else {
            warn!(entry = id, kind = %change_type, "skipping ledger entry with unknown kind");
            continue;
        };
        let Ok(timestamp) = parse_ts(&timestamp, "changes.timestamp") else {
            warn!(entry = id, "skipping ledger entry with unreadable timestamp");
            continue;
        };
        let details = match serde_json::from_str(&details) {
            Ok(value) => value,
            Err(_) => Value::String(details),
        };
        entries.push(LedgerEntry {
            id,
            board_id: board_id.to_string(),
            timestamp,
            kind,
            card_id: card,
            details,
        });
    }
    Ok(entries)
}

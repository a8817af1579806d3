//! Temporal store: versioned board state plus the append-only change
//! ledger, on SQLite.
//!
//! Layout: a `boards` registry, three temporal tables (`columns`, `cards`,
//! `attachments`) with `valid_from`/`valid_to` validity intervals, and the
//! append-only `changes` ledger. See [`temporal::TemporalStore`] for the
//! read/write contract and [`ledger`] for history queries.

pub mod db;
pub mod ledger;
pub mod temporal;

pub use db::{default_db_path, open_db, open_in_memory};
pub use ledger::LedgerEntry;
pub use temporal::{BoardInfo, EntityWriteFailure, TemporalStore, WriteReport};

use crate::error::{BoardWatchError, Result, StoreErrorKind};
use chrono::{DateTime, SecondsFormat, Utc};

/// Serialize a timestamp for storage. The fixed-width RFC 3339 form keeps
/// lexicographic and chronological order identical, which the ledger's
/// `timestamp >=` comparisons rely on.
#[must_use]
pub(crate) fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp back, naming the offending column on failure.
pub(crate) fn parse_ts(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            BoardWatchError::store(
                "timestamp decode",
                StoreErrorKind::InvalidTimestamp {
                    column: column.to_string(),
                    value: value.to_string(),
                },
            )
        })
}

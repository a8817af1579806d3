//! SQLite connection bootstrap and schema migrations.
//!
//! Opened connections have `foreign_keys=ON`, a busy timeout, and all
//! pending migrations applied. Migrations run in strictly increasing order
//! inside one transaction and mirror the applied version to
//! `PRAGMA user_version`.

use crate::error::{BoardWatchError, Result, StoreErrorKind};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: SCHEMA_V1,
}];

/// Initial schema: board registry, three temporal tables with
/// `valid_from`/`valid_to` intervals, and the append-only change ledger.
const SCHEMA_V1: &str = "
CREATE TABLE boards (
    board_id      TEXT PRIMARY KEY,
    name          TEXT,
    description   TEXT,
    first_checked TEXT NOT NULL,
    last_checked  TEXT NOT NULL
);

CREATE TABLE columns (
    id         INTEGER PRIMARY KEY,
    board_id   TEXT NOT NULL REFERENCES boards(board_id) ON DELETE CASCADE,
    column_id  TEXT NOT NULL,
    name       TEXT NOT NULL,
    position   INTEGER,
    color      TEXT,
    valid_from TEXT NOT NULL,
    valid_to   TEXT,
    UNIQUE (board_id, column_id, valid_from)
);
CREATE INDEX idx_columns_current ON columns (board_id, column_id, valid_to);

CREATE TABLE cards (
    id          INTEGER PRIMARY KEY,
    board_id    TEXT NOT NULL REFERENCES boards(board_id) ON DELETE CASCADE,
    card_id     TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    link        TEXT,
    column_id   TEXT,
    column_name TEXT,
    position    INTEGER,
    valid_from  TEXT NOT NULL,
    valid_to    TEXT,
    UNIQUE (board_id, card_id, valid_from)
);
CREATE INDEX idx_cards_current ON cards (board_id, card_id, valid_to);

CREATE TABLE attachments (
    id            INTEGER PRIMARY KEY,
    board_id      TEXT NOT NULL REFERENCES boards(board_id) ON DELETE CASCADE,
    card_id       TEXT NOT NULL,
    attachment_id TEXT NOT NULL,
    filename      TEXT NOT NULL,
    download_url  TEXT NOT NULL,
    mime_type     TEXT,
    length        INTEGER,
    valid_from    TEXT NOT NULL,
    valid_to      TEXT,
    UNIQUE (board_id, card_id, attachment_id, valid_from)
);
CREATE INDEX idx_attachments_current
    ON attachments (board_id, card_id, attachment_id, valid_to);

CREATE TABLE changes (
    id          INTEGER PRIMARY KEY,
    board_id    TEXT NOT NULL REFERENCES boards(board_id) ON DELETE CASCADE,
    timestamp   TEXT NOT NULL,
    change_type TEXT NOT NULL,
    card_id     TEXT NOT NULL,
    details     TEXT NOT NULL
);
CREATE INDEX idx_changes_board_time ON changes (board_id, timestamp);
CREATE INDEX idx_changes_card_time  ON changes (board_id, card_id, timestamp);
";

/// Latest migration version known by this binary.
fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Open a SQLite database file, creating parent directories as needed, and
/// apply all pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BoardWatchError::io(parent, e))?;
    }
    let mut conn = Connection::open(path)?;
    bootstrap_connection(&mut conn)?;
    debug!(path = %path.display(), "database opened");
    Ok(conn)
}

/// Open an in-memory SQLite database with migrations applied.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    bootstrap_connection(&mut conn)?;
    Ok(conn)
}

/// Default database location under the user's cache directory.
#[must_use]
pub fn default_db_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("board-watch")
        .join("board-watch.db")
}

fn bootstrap_connection(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}

/// Apply all pending migrations on the provided connection.
fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let current: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();

    if current > latest {
        return Err(BoardWatchError::store(
            "schema check",
            StoreErrorKind::UnsupportedSchemaVersion {
                db_version: current,
                latest_supported: latest,
            },
        ));
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;
    debug!(from = current, to = latest, "migrations applied");

    Ok(())
}

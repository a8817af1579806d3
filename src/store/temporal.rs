//! Bitemporal persistence of board snapshots.
//!
//! Every column, card, and attachment is stored as versioned records with a
//! `valid_from`/`valid_to` interval. For a given entity key at most one
//! version is open (`valid_to IS NULL`) at any time; a new version is
//! created only when at least one tracked attribute differs from the
//! currently-open version, so unchanged re-observations create no rows.
//!
//! Writes are per-entity independent and best-effort: one entity's failure
//! is recorded in the [`WriteReport`] and surfaced to the caller, but does
//! not block the remaining entities or their ledger entries. Closed
//! versions are never mutated again.

use crate::diff::{Changeset, ChangeKind};
use crate::error::{BoardWatchError, Result};
use crate::model::{Attachment, Card, Column, Snapshot};
use crate::store::db;
use crate::store::ledger::{self, LedgerEntry};
use crate::store::{parse_ts, ts};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// A monitored board as registered in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardInfo {
    pub board_id: String,
    pub name: String,
    pub description: String,
    pub first_checked: DateTime<Utc>,
    pub last_checked: DateTime<Utc>,
}

/// One entity that could not be persisted during a `write` call.
#[derive(Debug, Clone)]
pub struct EntityWriteFailure {
    /// Entity kind: "column", "card", "attachment", or "ledger"
    pub entity_kind: &'static str,
    pub entity_id: String,
    pub message: String,
}

/// Outcome of one `write` call.
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    /// New versions opened (columns)
    pub columns_versioned: usize,
    /// New versions opened (cards)
    pub cards_versioned: usize,
    /// New versions opened (attachments)
    pub attachments_versioned: usize,
    /// Open versions closed for entities that disappeared from the board
    pub entities_closed: usize,
    /// Ledger entries appended
    pub ledger_entries: usize,
    /// Per-entity failures; empty on a fully clean write
    pub failures: Vec<EntityWriteFailure>,
}

impl WriteReport {
    /// Whether every entity persisted without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Tracked card attributes as persisted, attachments excluded (those are
/// versioned independently).
#[derive(Debug, Clone, PartialEq, Eq)]
struct CardRow {
    title: String,
    description: String,
    link: Option<String>,
    column_id: Option<String>,
    column_name: Option<String>,
    position: Option<i64>,
}

impl CardRow {
    fn from_snapshot(snapshot: &Snapshot, card: &Card) -> Self {
        Self {
            title: card.title.clone(),
            description: card.description.clone(),
            link: card.link.clone(),
            column_id: card.column_id.clone(),
            column_name: snapshot.column_name(card).map(String::from),
            position: card.position,
        }
    }
}

/// SQLite-backed temporal store for board snapshots and the change ledger.
pub struct TemporalStore {
    conn: Connection,
}

impl TemporalStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            conn: db::open_db(path)?,
        })
    }

    /// Open an in-memory store, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: db::open_in_memory()?,
        })
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Reconstruct the current snapshot of a board from all open versions.
    ///
    /// Returns `Ok(None)` when the board has never been recorded. A board
    /// that was recorded with zero cards still reconstructs (as an empty
    /// snapshot) — emptiness is not first-run.
    pub fn read_current(&self, board_id: &str) -> Result<Option<Snapshot>> {
        let board: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT name, description, last_checked FROM boards WHERE board_id = ?1",
                params![board_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((name, description, last_checked)) = board else {
            return Ok(None);
        };
        let captured_at = parse_ts(&last_checked, "boards.last_checked")?;

        let mut columns: IndexMap<String, Column> = IndexMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT column_id, name, position, color FROM columns \
                 WHERE board_id = ?1 AND valid_to IS NULL ORDER BY position",
            )?;
            let rows = stmt.query_map(params![board_id], |row| {
                Ok(Column {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    position: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                    color: row.get(3)?,
                })
            })?;
            for column in rows {
                let column = column?;
                columns.insert(column.id.clone(), column);
            }
        }

        let mut attachments_by_card: HashMap<String, Vec<Attachment>> = HashMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT card_id, attachment_id, filename, download_url, mime_type, length \
                 FROM attachments WHERE board_id = ?1 AND valid_to IS NULL ORDER BY id",
            )?;
            let rows = stmt.query_map(params![board_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    Attachment {
                        id: row.get(1)?,
                        filename: row.get(2)?,
                        download_url: row.get(3)?,
                        mime_type: row.get(4)?,
                        length: row.get(5)?,
                    },
                ))
            })?;
            for row in rows {
                let (card_id, attachment) = row?;
                attachments_by_card.entry(card_id).or_default().push(attachment);
            }
        }

        let mut cards: IndexMap<String, Card> = IndexMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT card_id, title, description, link, column_id, position FROM cards \
                 WHERE board_id = ?1 AND valid_to IS NULL ORDER BY id",
            )?;
            let rows = stmt.query_map(params![board_id], |row| {
                Ok(Card {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    link: row.get(3)?,
                    column_id: row.get(4)?,
                    position: row.get(5)?,
                    attachments: Vec::new(),
                })
            })?;
            for card in rows {
                let mut card = card?;
                if let Some(attachments) = attachments_by_card.remove(&card.id) {
                    card.attachments = attachments;
                }
                cards.insert(card.id.clone(), card);
            }
        }

        Ok(Some(Snapshot {
            board_id: board_id.to_string(),
            name,
            description,
            columns,
            cards,
            captured_at,
        }))
    }

    /// Like [`read_current`](Self::read_current), but fails open: corrupt or
    /// unreadable previous state degrades to "no previous state" (first-run
    /// behavior) instead of blocking the observation cycle.
    #[must_use]
    pub fn load_previous(&self, board_id: &str) -> Option<Snapshot> {
        match self.read_current(board_id) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    board = %board_id,
                    error = %err,
                    "previous state unreadable, treating as first run"
                );
                None
            }
        }
    }

    /// All boards ever checked, most recently checked first.
    pub fn boards(&self) -> Result<Vec<BoardInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT board_id, name, description, first_checked, last_checked \
             FROM boards ORDER BY last_checked DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut boards = Vec::new();
        for row in rows {
            let (board_id, name, description, first_checked, last_checked) = row?;
            boards.push(BoardInfo {
                board_id,
                name: name.unwrap_or_default(),
                description: description.unwrap_or_default(),
                first_checked: parse_ts(&first_checked, "boards.first_checked")?,
                last_checked: parse_ts(&last_checked, "boards.last_checked")?,
            });
        }
        Ok(boards)
    }

    /// Ledger entries for a board, newest first. Optional `since` and card
    /// filters narrow the result; `limit` bounds it.
    pub fn history(
        &self,
        board_id: &str,
        since: Option<DateTime<Utc>>,
        card_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>> {
        ledger::query_history(&self.conn, board_id, since, card_id, limit)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Persist one observation: version every entity whose tracked
    /// attributes changed, close versions of disappeared entities, and
    /// append ledger entries for the changeset's card-level changes.
    ///
    /// Persistence is per-entity isolated: failures land in the returned
    /// [`WriteReport`] without blocking other entities. The outer `Result`
    /// is an error only when the store is unusable as a whole.
    pub fn write(
        &mut self,
        snapshot: &Snapshot,
        changeset: &Changeset,
        now: DateTime<Utc>,
    ) -> Result<WriteReport> {
        if snapshot.board_id.is_empty() {
            return Err(BoardWatchError::validation("board id must not be empty"));
        }
        let now_str = ts(now);
        let mut report = WriteReport::default();

        self.upsert_board(snapshot, &now_str)?;
        self.version_columns(snapshot, &now_str, &mut report);
        self.version_cards(snapshot, &now_str, &mut report);
        self.version_attachments(snapshot, &now_str, &mut report);
        self.append_ledger(changeset, &now_str, &mut report);

        debug!(
            board = %snapshot.board_id,
            columns = report.columns_versioned,
            cards = report.cards_versioned,
            attachments = report.attachments_versioned,
            closed = report.entities_closed,
            ledger = report.ledger_entries,
            failures = report.failures.len(),
            "write complete"
        );
        Ok(report)
    }

    fn upsert_board(&self, snapshot: &Snapshot, now_str: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO boards (board_id, name, description, first_checked, last_checked) \
             VALUES (?1, ?2, ?3, ?4, ?4) \
             ON CONFLICT(board_id) DO UPDATE SET \
               name = excluded.name, \
               description = excluded.description, \
               last_checked = excluded.last_checked",
            params![
                snapshot.board_id,
                snapshot.name,
                snapshot.description,
                now_str
            ],
        )?;
        Ok(())
    }

    fn record_failure(
        report: &mut WriteReport,
        entity_kind: &'static str,
        entity_id: &str,
        err: &dyn std::fmt::Display,
    ) {
        warn!(kind = entity_kind, entity = %entity_id, error = %err, "entity write failed");
        report.failures.push(EntityWriteFailure {
            entity_kind,
            entity_id: entity_id.to_string(),
            message: err.to_string(),
        });
    }

    fn version_columns(&mut self, snapshot: &Snapshot, now_str: &str, report: &mut WriteReport) {
        let open = match self.open_columns(&snapshot.board_id) {
            Ok(open) => open,
            Err(err) => {
                Self::record_failure(report, "column", "*", &err);
                return;
            }
        };

        for column in snapshot.columns.values() {
            let existing = open.get(&column.id);
            if existing.is_some_and(|(_, c)| c == column) {
                continue; // unchanged re-observation
            }
            let result = Self::supersede(
                &mut self.conn,
                existing.map(|(rowid, _)| ("columns", *rowid)),
                now_str,
                |tx| {
                    tx.execute(
                        "INSERT INTO columns \
                         (board_id, column_id, name, position, color, valid_from) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            snapshot.board_id,
                            column.id,
                            column.name,
                            column.position,
                            column.color,
                            now_str
                        ],
                    )
                },
            );
            match result {
                Ok(()) => report.columns_versioned += 1,
                Err(err) => Self::record_failure(report, "column", &column.id, &err),
            }
        }

        for (column_id, (rowid, _)) in &open {
            if snapshot.columns.contains_key(column_id) {
                continue;
            }
            match self.close_version("columns", *rowid, now_str) {
                Ok(()) => report.entities_closed += 1,
                Err(err) => Self::record_failure(report, "column", column_id, &err),
            }
        }
    }

    fn version_cards(&mut self, snapshot: &Snapshot, now_str: &str, report: &mut WriteReport) {
        let open = match self.open_cards(&snapshot.board_id) {
            Ok(open) => open,
            Err(err) => {
                Self::record_failure(report, "card", "*", &err);
                return;
            }
        };

        for card in snapshot.cards.values() {
            let row = CardRow::from_snapshot(snapshot, card);
            let existing = open.get(&card.id);
            if existing.is_some_and(|(_, r)| *r == row) {
                continue;
            }
            let result = Self::supersede(
                &mut self.conn,
                existing.map(|(rowid, _)| ("cards", *rowid)),
                now_str,
                |tx| {
                    tx.execute(
                        "INSERT INTO cards \
                         (board_id, card_id, title, description, link, column_id, \
                          column_name, position, valid_from) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                        params![
                            snapshot.board_id,
                            card.id,
                            row.title,
                            row.description,
                            row.link,
                            row.column_id,
                            row.column_name,
                            row.position,
                            now_str
                        ],
                    )
                },
            );
            match result {
                Ok(()) => report.cards_versioned += 1,
                Err(err) => Self::record_failure(report, "card", &card.id, &err),
            }
        }

        for (card_id, (rowid, _)) in &open {
            if snapshot.cards.contains_key(card_id) {
                continue;
            }
            match self.close_version("cards", *rowid, now_str) {
                Ok(()) => report.entities_closed += 1,
                Err(err) => Self::record_failure(report, "card", card_id, &err),
            }
        }
    }

    fn version_attachments(&mut self, snapshot: &Snapshot, now_str: &str, report: &mut WriteReport) {
        let open = match self.open_attachments(&snapshot.board_id) {
            Ok(open) => open,
            Err(err) => {
                Self::record_failure(report, "attachment", "*", &err);
                return;
            }
        };

        let mut live: HashMap<(String, String), &Attachment> = HashMap::new();
        for card in snapshot.cards.values() {
            for attachment in &card.attachments {
                live.insert((card.id.clone(), attachment.id.clone()), attachment);
            }
        }

        for ((card_id, attachment_id), attachment) in &live {
            let key = (card_id.clone(), attachment_id.clone());
            let existing = open.get(&key);
            if existing.is_some_and(|(_, a)| a == *attachment) {
                continue;
            }
            let result = Self::supersede(
                &mut self.conn,
                existing.map(|(rowid, _)| ("attachments", *rowid)),
                now_str,
                |tx| {
                    tx.execute(
                        "INSERT INTO attachments \
                         (board_id, card_id, attachment_id, filename, download_url, \
                          mime_type, length, valid_from) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        params![
                            snapshot.board_id,
                            card_id,
                            attachment.id,
                            attachment.filename,
                            attachment.download_url,
                            attachment.mime_type,
                            attachment.length,
                            now_str
                        ],
                    )
                },
            );
            match result {
                Ok(()) => report.attachments_versioned += 1,
                Err(err) => Self::record_failure(report, "attachment", attachment_id, &err),
            }
        }

        for (key, (rowid, _)) in &open {
            if live.contains_key(key) {
                continue;
            }
            match self.close_version("attachments", *rowid, now_str) {
                Ok(()) => report.entities_closed += 1,
                Err(err) => Self::record_failure(report, "attachment", &key.1, &err),
            }
        }
    }

    /// Close the currently-open version (when there is one) and insert the
    /// new version, atomically per entity.
    fn supersede(
        conn: &mut Connection,
        close: Option<(&'static str, i64)>,
        now_str: &str,
        insert: impl FnOnce(&rusqlite::Transaction<'_>) -> rusqlite::Result<usize>,
    ) -> Result<()> {
        let tx = conn.transaction()?;
        if let Some((table, rowid)) = close {
            tx.execute(
                &format!("UPDATE {table} SET valid_to = ?1 WHERE id = ?2"),
                params![now_str, rowid],
            )?;
        }
        insert(&tx)?;
        tx.commit()?;
        Ok(())
    }

    fn close_version(&self, table: &'static str, rowid: i64, now_str: &str) -> Result<()> {
        self.conn.execute(
            &format!("UPDATE {table} SET valid_to = ?1 WHERE id = ?2"),
            params![now_str, rowid],
        )?;
        Ok(())
    }

    fn append_ledger(&self, changeset: &Changeset, now_str: &str, report: &mut WriteReport) {
        // First runs have nothing to compare against; column-only changes
        // are visible in the temporal tables but not in the card ledger.
        if changeset.is_first_run {
            return;
        }

        for card in &changeset.cards.added {
            self.append_one(changeset, ChangeKind::CardAdded, &card.id, card, now_str, report);
        }
        for card in &changeset.cards.removed {
            self.append_one(changeset, ChangeKind::CardRemoved, &card.id, card, now_str, report);
        }
        for modified in &changeset.cards.modified {
            let kind = Changeset::kind_for_modified(modified);
            self.append_one(changeset, kind, &modified.id, modified, now_str, report);
        }
    }

    fn append_one<T: serde::Serialize>(
        &self,
        changeset: &Changeset,
        kind: ChangeKind,
        card_id: &str,
        details: &T,
        now_str: &str,
        report: &mut WriteReport,
    ) {
        let details_json = match serde_json::to_string(details) {
            Ok(json) => json,
            Err(err) => {
                Self::record_failure(report, "ledger", card_id, &err);
                return;
            }
        };
        match ledger::append_entry(
            &self.conn,
            &changeset.board_id,
            now_str,
            kind,
            card_id,
            &details_json,
        ) {
            Ok(()) => report.ledger_entries += 1,
            Err(err) => Self::record_failure(report, "ledger", card_id, &err),
        }
    }

    // ------------------------------------------------------------------
    // Open-version lookups
    // ------------------------------------------------------------------

    fn open_columns(&self, board_id: &str) -> Result<HashMap<String, (i64, Column)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, column_id, name, position, color FROM columns \
             WHERE board_id = ?1 AND valid_to IS NULL",
        )?;
        let rows = stmt.query_map(params![board_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Column {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    position: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                    color: row.get(4)?,
                },
            ))
        })?;
        let mut open = HashMap::new();
        for row in rows {
            let (rowid, column) = row?;
            open.insert(column.id.clone(), (rowid, column));
        }
        Ok(open)
    }

    fn open_cards(&self, board_id: &str) -> Result<HashMap<String, (i64, CardRow)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, card_id, title, description, link, column_id, column_name, position \
             FROM cards WHERE board_id = ?1 AND valid_to IS NULL",
        )?;
        let rows = stmt.query_map(params![board_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                CardRow {
                    title: row.get(2)?,
                    description: row.get(3)?,
                    link: row.get(4)?,
                    column_id: row.get(5)?,
                    column_name: row.get(6)?,
                    position: row.get(7)?,
                },
            ))
        })?;
        let mut open = HashMap::new();
        for row in rows {
            let (rowid, card_id, card_row) = row?;
            open.insert(card_id, (rowid, card_row));
        }
        Ok(open)
    }

    #[allow(clippy::type_complexity)]
    fn open_attachments(
        &self,
        board_id: &str,
    ) -> Result<HashMap<(String, String), (i64, Attachment)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, card_id, attachment_id, filename, download_url, mime_type, length \
             FROM attachments WHERE board_id = ?1 AND valid_to IS NULL",
        )?;
        let rows = stmt.query_map(params![board_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                Attachment {
                    id: row.get(2)?,
                    filename: row.get(3)?,
                    download_url: row.get(4)?,
                    mime_type: row.get(5)?,
                    length: row.get(6)?,
                },
            ))
        })?;
        let mut open = HashMap::new();
        for row in rows {
            let (rowid, card_id, attachment) = row?;
            open.insert((card_id, attachment.id.clone()), (rowid, attachment));
        }
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEngine;
    use chrono::Duration;

    fn column(id: &str, name: &str, position: i64) -> Column {
        Column {
            id: id.to_string(),
            name: name.to_string(),
            position,
            color: None,
        }
    }

    fn card_in(id: &str, title: &str, column_id: Option<&str>) -> Card {
        Card {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            link: None,
            column_id: column_id.map(String::from),
            position: None,
            attachments: Vec::new(),
        }
    }

    fn snapshot(columns: Vec<Column>, cards: Vec<Card>, at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            board_id: "b1".to_string(),
            name: "Board".to_string(),
            description: "desc".to_string(),
            columns: columns.into_iter().map(|c| (c.id.clone(), c)).collect(),
            cards: cards.into_iter().map(|c| (c.id.clone(), c)).collect(),
            captured_at: at,
        }
    }

    fn check(store: &mut TemporalStore, snap: &Snapshot, now: DateTime<Utc>) -> WriteReport {
        let previous = store.load_previous(&snap.board_id);
        let changeset = DiffEngine::new().compare(previous.as_ref(), snap);
        store.write(snap, &changeset, now).unwrap()
    }

    fn row_count(store: &TemporalStore, table: &str) -> i64 {
        store
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_first_write_then_read_round_trip() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let now = Utc::now();
        let mut card = card_in("c1", "Task 1", Some("l1"));
        card.attachments.push(Attachment {
            id: "a1".to_string(),
            filename: "spec.pdf".to_string(),
            download_url: "https://example.test/a1".to_string(),
            mime_type: None,
            length: Some(7),
        });
        let snap = snapshot(vec![column("l1", "To Do", 0)], vec![card], now);

        assert!(store.read_current("b1").unwrap().is_none());
        let report = check(&mut store, &snap, now);
        assert!(report.is_clean());
        assert_eq!(report.columns_versioned, 1);
        assert_eq!(report.cards_versioned, 1);
        assert_eq!(report.attachments_versioned, 1);
        assert_eq!(report.ledger_entries, 0, "first run must not touch the ledger");

        let read = store.read_current("b1").unwrap().unwrap();
        assert_eq!(read.board_id, "b1");
        assert_eq!(read.column_count(), 1);
        let card = read.cards.get("c1").unwrap();
        assert_eq!(card.title, "Task 1");
        assert_eq!(card.attachments.len(), 1);
        assert_eq!(read.column_name(card), Some("To Do"));
    }

    #[test]
    fn test_unchanged_rewrite_creates_no_versions() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        let snap = snapshot(
            vec![column("l1", "To Do", 0)],
            vec![card_in("c1", "Task 1", Some("l1"))],
            t0,
        );
        check(&mut store, &snap, t0);

        let cards_before = row_count(&store, "cards");
        let changes_before = row_count(&store, "changes");

        let mut again = snap.clone();
        again.captured_at = t0 + Duration::seconds(60);
        let report = check(&mut store, &again, again.captured_at);

        assert!(report.is_clean());
        assert_eq!(report.cards_versioned, 0);
        assert_eq!(report.columns_versioned, 0);
        assert_eq!(row_count(&store, "cards"), cards_before);
        assert_eq!(row_count(&store, "changes"), changes_before);
    }

    #[test]
    fn test_value_change_closes_and_opens_versions() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(60);

        check(
            &mut store,
            &snapshot(vec![], vec![card_in("c1", "Task 1", None)], t0),
            t0,
        );
        check(
            &mut store,
            &snapshot(vec![], vec![card_in("c1", "Task 1 Updated", None)], t1),
            t1,
        );

        // Two versions total, exactly one open
        assert_eq!(row_count(&store, "cards"), 2);
        let open: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM cards WHERE board_id = 'b1' \
                 AND card_id = 'c1' AND valid_to IS NULL",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(open, 1);

        let read = store.read_current("b1").unwrap().unwrap();
        assert_eq!(read.cards.get("c1").unwrap().title, "Task 1 Updated");
    }

    #[test]
    fn test_removed_entity_version_is_closed() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(60);

        check(
            &mut store,
            &snapshot(vec![], vec![card_in("c1", "A", None), card_in("c2", "B", None)], t0),
            t0,
        );
        let report = check(
            &mut store,
            &snapshot(vec![], vec![card_in("c1", "A", None)], t1),
            t1,
        );

        assert_eq!(report.entities_closed, 1);
        let read = store.read_current("b1").unwrap().unwrap();
        assert_eq!(read.card_count(), 1);
        assert!(read.cards.get("c2").is_none());
    }

    #[test]
    fn test_ledger_entries_per_card_change() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(60);

        check(
            &mut store,
            &snapshot(vec![], vec![card_in("c1", "Task 1", None), card_in("c2", "Task 2", None)], t0),
            t0,
        );
        let report = check(
            &mut store,
            &snapshot(
                vec![],
                vec![card_in("c1", "Task 1 Updated", None), card_in("c3", "Task 3", None)],
                t1,
            ),
            t1,
        );

        // one added, one removed, one modified
        assert_eq!(report.ledger_entries, 3);

        let history = store.history("b1", None, None, 10).unwrap();
        assert_eq!(history.len(), 3);
        let kinds: Vec<ChangeKind> = history.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&ChangeKind::CardAdded));
        assert!(kinds.contains(&ChangeKind::CardRemoved));
        assert!(kinds.contains(&ChangeKind::CardModified));
    }

    #[test]
    fn test_pure_move_is_ledgered_as_card_moved() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(60);
        let cols = vec![column("l1", "To Do", 0), column("l2", "Done", 1)];

        check(
            &mut store,
            &snapshot(cols.clone(), vec![card_in("c1", "Task", Some("l1"))], t0),
            t0,
        );
        check(
            &mut store,
            &snapshot(cols, vec![card_in("c1", "Task", Some("l2"))], t1),
            t1,
        );

        let history = store.history("b1", None, None, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, ChangeKind::CardMoved);
        assert_eq!(history[0].card_id, "c1");
    }

    #[test]
    fn test_column_only_change_stays_out_of_ledger() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(60);

        check(
            &mut store,
            &snapshot(vec![column("l1", "To Do", 0)], vec![], t0),
            t0,
        );
        check(
            &mut store,
            &snapshot(vec![column("l1", "Backlog", 0)], vec![], t1),
            t1,
        );

        assert_eq!(store.history("b1", None, None, 10).unwrap().len(), 0);
        // ...but the temporal table recorded the rename as a new version
        assert_eq!(row_count(&store, "columns"), 2);
    }

    #[test]
    fn test_empty_board_is_not_first_run_twice() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        check(&mut store, &snapshot(vec![], vec![], t0), t0);

        let read = store.read_current("b1").unwrap();
        assert!(read.is_some(), "an observed empty board is previous state");
        assert_eq!(read.unwrap().card_count(), 0);
    }

    #[test]
    fn test_boards_listing() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        check(&mut store, &snapshot(vec![], vec![], t0), t0);

        let boards = store.boards().unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].board_id, "b1");
        assert_eq!(boards[0].name, "Board");
    }

    #[test]
    fn test_write_rejects_empty_board_id() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        let now = Utc::now();
        let mut snap = snapshot(vec![], vec![], now);
        snap.board_id = String::new();
        let changeset = DiffEngine::new().compare(None, &snap);
        assert!(store.write(&snap, &changeset, now).is_err());
    }

    #[test]
    fn test_attachment_metadata_edit_versions_quietly() {
        // Same attachment id, new filename: invisible to the changeset but
        // versioned in the temporal table.
        let mut store = TemporalStore::open_in_memory().unwrap();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(60);

        let mut card = card_in("c1", "Task", None);
        card.attachments.push(Attachment {
            id: "a1".to_string(),
            filename: "old.pdf".to_string(),
            download_url: "https://example.test/a1".to_string(),
            mime_type: None,
            length: None,
        });
        check(&mut store, &snapshot(vec![], vec![card.clone()], t0), t0);

        card.attachments[0].filename = "new.pdf".to_string();
        let report = check(&mut store, &snapshot(vec![], vec![card], t1), t1);

        assert_eq!(report.ledger_entries, 0);
        assert_eq!(report.attachments_versioned, 1);
        assert_eq!(row_count(&store, "attachments"), 2);
    }
}

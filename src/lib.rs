//! **Snapshot reconciliation and change tracking for externally-owned
//! boards.**
//!
//! `board-watch` observes a structured board (named columns containing
//! cards, each optionally carrying a description, link, and attachments)
//! and reports what changed since the last observation. It powers both a
//! command-line tool and a Rust library for programmatic use.
//!
//! The hard part is identity: the observed upstream is known to recycle and
//! reassign entity identifiers when items are inserted among existing ones,
//! so a naive id-diff reports phantom remove+add pairs for what is really
//! one rename or one move. The diff engine reconciles identity from three
//! signals — display name, structural position, and identifier coincidence
//! — and classifies each discontinuity as a rename, a move, or a genuine
//! remove+add.
//!
//! ## Core Concepts & Modules
//!
//! - **[`normalize`]**: the loose-payload boundary. Raw fetched payloads
//!   become a strict, immutable [`Snapshot`] here; all defaulting and
//!   dropping rules are applied exactly once.
//! - **[`diff`]**: the [`DiffEngine`] compares two snapshots into a
//!   classified [`Changeset`] — columns added/removed/renamed/moved, cards
//!   added/removed/modified with per-field old/new pairs and attachment
//!   membership diffs.
//! - **[`store`]**: the [`TemporalStore`] persists entities as versioned
//!   records with `valid_from`/`valid_to` intervals and appends card-level
//!   events to an append-only ledger for history queries.
//! - **[`reports`]**: plain-text rendering of changesets, snapshots, and
//!   history for the terminal.
//!
//! ## One observation cycle
//!
//! ```no_run
//! use board_watch::{normalize, DiffEngine, TemporalStore};
//! use chrono::Utc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let raw = normalize::read_payload(std::path::Path::new("board.json"))?;
//!     let snapshot = normalize::normalize(&raw, Utc::now());
//!
//!     let mut store = TemporalStore::open("state.db")?;
//!     let previous = store.load_previous(&snapshot.board_id);
//!
//!     let changeset = DiffEngine::new().compare(previous.as_ref(), &snapshot);
//!     store.write(&snapshot, &changeset, Utc::now())?;
//!
//!     for card in &changeset.cards.added {
//!         println!("+ {}", card.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The engine is synchronous and single-threaded; callers must serialize
//! observations per board (one writer per board at a time). Network fetch,
//! email notification, and credential handling are external collaborators —
//! this crate only consumes the payload they produce.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Variable names like `prev`/`curr` or `old`/`new` are clear in context
    clippy::similar_names,
    // # Errors / # Panics sections are aspirational for the public surface
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod normalize;
pub mod reports;
pub mod store;

// Re-export main types for convenience
pub use config::{load_or_default, BoardWatchConfig};
pub use diff::{
    CardChanges, CardModified, CardSummary, ChangeKind, Changeset, ColumnChanges, ColumnMoved,
    ColumnRenamed, ColumnSummary, DiffEngine,
};
pub use error::{BoardWatchError, ErrorContext, Result};
pub use model::{Attachment, Card, Column, Snapshot};
pub use store::{BoardInfo, LedgerEntry, TemporalStore, WriteReport};

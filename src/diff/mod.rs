//! Snapshot reconciliation and change classification.
//!
//! The diff system is split the same way the computation flows:
//!
//! - [`reconcile`]: multi-signal identity matching (name, structural
//!   position, identifier coincidence) producing added/removed/matched
//!   partitions plus rename/move resolution;
//! - [`changes`]: field-level comparison of matched cards and attachment
//!   set diffs;
//! - [`engine`]: the [`DiffEngine`] assembling both into one immutable
//!   [`Changeset`].

pub mod changes;
pub mod engine;
pub mod reconcile;
mod result;

pub use engine::DiffEngine;
pub use reconcile::{
    reconcile_cards, reconcile_columns, resolved_column, CardReconciliation,
    ColumnReconciliation,
};
pub use result::{
    CardChanges, CardModified, CardSummary, ChangeKind, Changeset, ColumnChanges, ColumnMoved,
    ColumnRenamed, ColumnSummary,
};

//! Change classification assembler.
//!
//! Pure aggregation over the reconciler and differ: one observation cycle's
//! comparison produces exactly one immutable [`Changeset`].

use crate::diff::changes::{diff_card, summarize_card, summarize_column};
use crate::diff::reconcile::{reconcile_cards, reconcile_columns};
use crate::diff::result::{CardChanges, Changeset, ColumnChanges};
use crate::model::Snapshot;
use tracing::debug;

/// Compares two snapshots of the same board.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    /// Create a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Classify the differences between `previous` and `current`.
    ///
    /// With no previous snapshot available this returns a first-run marker
    /// carrying only entity counts. A comparison with zero differences still
    /// returns a non-first-run changeset with every collection empty.
    #[must_use]
    pub fn compare(&self, previous: Option<&Snapshot>, current: &Snapshot) -> Changeset {
        let Some(previous) = previous else {
            debug!(
                board = %current.board_id,
                cards = current.card_count(),
                "no previous state, first observation"
            );
            return Changeset::first_run(
                current.board_id.clone(),
                current.column_count(),
                current.card_count(),
            );
        };

        let columns = reconcile_columns(previous, current);
        let cards = reconcile_cards(previous, current, &columns.rename_map);

        let modified: Vec<_> = cards
            .matched
            .iter()
            .filter_map(|(prev, curr)| {
                diff_card(previous, current, prev, curr, &columns.rename_map)
            })
            .collect();

        debug!(
            board = %current.board_id,
            columns_added = columns.added.len(),
            columns_removed = columns.removed.len(),
            columns_renamed = columns.renamed.len(),
            columns_moved = columns.moved.len(),
            cards_added = cards.added.len(),
            cards_removed = cards.removed.len(),
            cards_modified = modified.len(),
            "comparison classified"
        );

        Changeset {
            board_id: current.board_id.clone(),
            is_first_run: false,
            columns_count: current.column_count(),
            cards_count: current.card_count(),
            columns: ColumnChanges {
                added: columns.added.iter().map(summarize_column).collect(),
                removed: columns.removed.iter().map(summarize_column).collect(),
                renamed: columns.renamed,
                moved: columns.moved,
            },
            cards: CardChanges {
                added: cards
                    .added
                    .iter()
                    .map(|c| summarize_card(current, c))
                    .collect(),
                removed: cards
                    .removed
                    .iter()
                    .map(|c| summarize_card(previous, c))
                    .collect(),
                modified,
            },
        }
    }
}

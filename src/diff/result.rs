//! Changeset result structures.
//!
//! The [`Changeset`] is constructed once per comparison and is immutable
//! afterwards; the temporal store derives its own ledger entries from it
//! rather than persisting it as-is.

use crate::model::Attachment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a card-level change event, as recorded in the change ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    CardAdded,
    CardRemoved,
    CardModified,
    CardMoved,
}

impl ChangeKind {
    /// Stable string form used in the ledger table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CardAdded => "card_added",
            Self::CardRemoved => "card_removed",
            Self::CardModified => "card_modified",
            Self::CardMoved => "card_moved",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card_added" => Ok(Self::CardAdded),
            "card_removed" => Ok(Self::CardRemoved),
            "card_modified" => Ok(Self::CardModified),
            "card_moved" => Ok(Self::CardMoved),
            other => Err(format!("unknown change kind: {other}")),
        }
    }
}

/// A column that kept its slot and identifier but changed its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRenamed {
    pub id: String,
    pub old_name: String,
    pub new_name: String,
    pub position: i64,
}

/// A column whose structural position changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMoved {
    pub id: String,
    pub name: String,
    pub old_position: i64,
    pub new_position: i64,
}

/// Column-level classifications for one comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChanges {
    pub added: Vec<ColumnSummary>,
    pub removed: Vec<ColumnSummary>,
    pub renamed: Vec<ColumnRenamed>,
    pub moved: Vec<ColumnMoved>,
}

impl ColumnChanges {
    /// Whether any column-level change was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.renamed.is_empty()
            && self.moved.is_empty()
    }
}

/// A column as reported in the added/removed collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub id: String,
    pub name: String,
    pub position: i64,
    pub color: Option<String>,
}

/// A card as reported in the added/removed collections, with its column
/// reference resolved to a display name within its own snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub column: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// A matched card with at least one tracked attribute changed.
///
/// Carries old and new values for every tracked field (old == new for the
/// unchanged ones) so a consumer can distinguish "this field changed" from
/// "this field is merely present".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardModified {
    pub id: String,
    pub old_title: String,
    pub new_title: String,
    pub old_description: String,
    pub new_description: String,
    pub old_link: Option<String>,
    pub new_link: Option<String>,
    pub old_column: Option<String>,
    pub new_column: Option<String>,
    pub attachments_added: Vec<Attachment>,
    pub attachments_removed: Vec<Attachment>,
}

impl CardModified {
    /// Whether the title changed.
    #[must_use]
    pub fn title_changed(&self) -> bool {
        self.old_title != self.new_title
    }

    /// Whether the description changed.
    #[must_use]
    pub fn description_changed(&self) -> bool {
        self.old_description != self.new_description
    }

    /// Whether the link changed.
    #[must_use]
    pub fn link_changed(&self) -> bool {
        self.old_link != self.new_link
    }

    /// Whether the resolved column changed (a genuine move, rename noise
    /// already excluded by the reconciler).
    #[must_use]
    pub fn column_changed(&self) -> bool {
        self.old_column != self.new_column
    }

    /// Whether attachment membership changed.
    #[must_use]
    pub fn attachments_changed(&self) -> bool {
        !self.attachments_added.is_empty() || !self.attachments_removed.is_empty()
    }

    /// Whether the column move is the only tracked change.
    #[must_use]
    pub fn is_move_only(&self) -> bool {
        self.column_changed()
            && !self.title_changed()
            && !self.description_changed()
            && !self.link_changed()
            && !self.attachments_changed()
    }
}

/// Card-level classifications for one comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardChanges {
    pub added: Vec<CardSummary>,
    pub removed: Vec<CardSummary>,
    pub modified: Vec<CardModified>,
}

impl CardChanges {
    /// Whether any card-level change was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Classified result of comparing two snapshots.
///
/// Either a first-run marker carrying only entity counts, or the full set
/// of column/card classifications. Callers distinguish "checked, nothing
/// changed" from "never checked before" by [`Changeset::is_first_run`], not
/// by emptiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct Changeset {
    pub board_id: String,
    pub is_first_run: bool,
    /// Column count of the current snapshot
    pub columns_count: usize,
    /// Card count of the current snapshot
    pub cards_count: usize,
    pub columns: ColumnChanges,
    pub cards: CardChanges,
}

impl Changeset {
    /// First-observation marker: counts only, no per-entity detail.
    pub fn first_run(board_id: impl Into<String>, columns_count: usize, cards_count: usize) -> Self {
        Self {
            board_id: board_id.into(),
            is_first_run: true,
            columns_count,
            cards_count,
            columns: ColumnChanges::default(),
            cards: CardChanges::default(),
        }
    }

    /// Whether any change was detected. Always false for first runs.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.columns.is_empty() || !self.cards.is_empty()
    }

    /// Modified cards whose resolved column changed.
    pub fn moved_cards(&self) -> impl Iterator<Item = &CardModified> {
        self.cards.modified.iter().filter(|m| m.column_changed())
    }

    /// Ledger kind for one modified card: a pure column move is recorded as
    /// `card_moved`, anything else as `card_modified`.
    #[must_use]
    pub fn kind_for_modified(modified: &CardModified) -> ChangeKind {
        if modified.is_move_only() {
            ChangeKind::CardMoved
        } else {
            ChangeKind::CardModified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unchanged_modified() -> CardModified {
        CardModified {
            id: "c1".to_string(),
            old_title: "t".to_string(),
            new_title: "t".to_string(),
            old_description: String::new(),
            new_description: String::new(),
            old_link: None,
            new_link: None,
            old_column: Some("A".to_string()),
            new_column: Some("A".to_string()),
            attachments_added: Vec::new(),
            attachments_removed: Vec::new(),
        }
    }

    #[test]
    fn test_change_kind_round_trip() {
        for kind in [
            ChangeKind::CardAdded,
            ChangeKind::CardRemoved,
            ChangeKind::CardModified,
            ChangeKind::CardMoved,
        ] {
            assert_eq!(kind.as_str().parse::<ChangeKind>().unwrap(), kind);
        }
        assert!("card_exploded".parse::<ChangeKind>().is_err());
    }

    #[test]
    fn test_first_run_marker() {
        let cs = Changeset::first_run("b1", 3, 12);
        assert!(cs.is_first_run);
        assert_eq!(cs.cards_count, 12);
        assert_eq!(cs.columns_count, 3);
        assert!(!cs.has_changes());
    }

    #[test]
    fn test_is_move_only() {
        let mut m = unchanged_modified();
        m.new_column = Some("B".to_string());
        assert!(m.is_move_only());
        assert_eq!(Changeset::kind_for_modified(&m), ChangeKind::CardMoved);

        m.new_title = "renamed".to_string();
        assert!(!m.is_move_only());
        assert_eq!(Changeset::kind_for_modified(&m), ChangeKind::CardModified);
    }

    #[test]
    fn test_moved_cards_filter() {
        let mut moved = unchanged_modified();
        moved.new_column = Some("B".to_string());
        let mut retitled = unchanged_modified();
        retitled.id = "c2".to_string();
        retitled.new_title = "new".to_string();

        let cs = Changeset {
            board_id: "b1".to_string(),
            is_first_run: false,
            columns_count: 2,
            cards_count: 2,
            columns: ColumnChanges::default(),
            cards: CardChanges {
                added: Vec::new(),
                removed: Vec::new(),
                modified: vec![moved, retitled],
            },
        };
        let moved_ids: Vec<&str> = cs.moved_cards().map(|m| m.id.as_str()).collect();
        assert_eq!(moved_ids, vec!["c1"]);
    }
}

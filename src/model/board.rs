//! Core snapshot data structures.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A list/column on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Upstream column identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// 0-based structural position; dense but not guaranteed contiguous
    /// after churn
    pub position: i64,
    /// Optional color tag
    pub color: Option<String>,
}

/// A file attached to a card.
///
/// Identity is the id alone; a file can be renamed without changing
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Upstream attachment identifier
    pub id: String,
    /// Name of the attached file
    pub filename: String,
    /// URL to download the attachment
    pub download_url: String,
    /// MIME type, when the upstream reports one
    pub mime_type: Option<String>,
    /// Size in bytes, when the upstream reports one
    pub length: Option<i64>,
}

/// A card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Upstream card identifier
    pub id: String,
    /// Card title
    pub title: String,
    /// Card description (empty string when absent upstream)
    pub description: String,
    /// External link associated with the card
    pub link: Option<String>,
    /// Owning column id. May be dangling in the raw payload; resolution
    /// happens lazily via [`Snapshot::column_name`], and the raw id is kept
    /// here for debugging.
    pub column_id: Option<String>,
    /// Position within the owning column
    pub position: Option<i64>,
    /// Attachments, id-unique within the card
    pub attachments: Vec<Attachment>,
}

impl Card {
    /// Ids of all attachments on this card.
    #[must_use]
    pub fn attachment_ids(&self) -> HashSet<&str> {
        self.attachments.iter().map(|a| a.id.as_str()).collect()
    }

    /// Look up an attachment by id.
    #[must_use]
    pub fn attachment(&self, id: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == id)
    }
}

/// Immutable representation of the board at one instant.
///
/// Columns are keyed by column id and ordered by structural position; cards
/// are keyed by card id in payload order. Both maps guarantee id uniqueness
/// within the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Upstream board identifier
    pub board_id: String,
    /// Board name
    pub name: String,
    /// Board description
    pub description: String,
    /// Columns by id, ordered by position
    pub columns: IndexMap<String, Column>,
    /// Cards by id
    pub cards: IndexMap<String, Card>,
    /// When this snapshot was captured
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Resolve a card's column reference to the column's display name.
    ///
    /// A dangling or absent reference resolves to `None` ("no column"); the
    /// raw id stays available on the card itself.
    #[must_use]
    pub fn column_name(&self, card: &Card) -> Option<&str> {
        card.column_id
            .as_deref()
            .and_then(|id| self.columns.get(id))
            .map(|c| c.name.as_str())
    }

    /// Columns sorted by structural position.
    #[must_use]
    pub fn columns_by_position(&self) -> Vec<&Column> {
        let mut cols: Vec<&Column> = self.columns.values().collect();
        cols.sort_by_key(|c| c.position);
        cols
    }

    /// Cards belonging to the given column, sorted by in-column position.
    #[must_use]
    pub fn cards_in_column(&self, column_id: &str) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self
            .cards
            .values()
            .filter(|c| c.column_id.as_deref() == Some(column_id))
            .collect();
        cards.sort_by_key(|c| c.position);
        cards
    }

    /// Cards whose column reference is absent or does not resolve.
    #[must_use]
    pub fn unassigned_cards(&self) -> Vec<&Card> {
        self.cards
            .values()
            .filter(|c| self.column_name(c).is_none())
            .collect()
    }

    /// Total column count.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Total card count.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

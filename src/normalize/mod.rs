//! Snapshot normalizer — the loose-payload boundary.
//!
//! Turns the fetch collaborator's raw board payload into a canonical
//! [`Snapshot`]. All defaulting and dropping rules live here so that
//! downstream logic operates on a fully-typed model:
//!
//! - entries missing a required identifier are silently dropped (logged at
//!   debug level, never an error);
//! - missing optional fields default to empty string / `None` / empty set;
//! - a card's column membership is carried as the raw column id and resolved
//!   lazily via [`Snapshot::column_name`], never validated eagerly.
//!
//! Normalization is a pure function of its input; the capture timestamp is
//! an argument.

use crate::error::Result;
use crate::model::{Attachment, Card, Column, Snapshot};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

// ============================================================================
// Raw payload shape (fetch collaborator contract)
// ============================================================================

/// Raw board payload as produced by the fetch collaborator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawBoard {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub lists: Vec<RawList>,
    pub cards: Vec<RawCard>,
}

/// Raw list/column entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawList {
    pub id: Option<String>,
    pub name: Option<String>,
    pub position: Option<i64>,
    pub color: Option<String>,
}

/// Raw card entry. Column membership is expressed as a nested position
/// object referencing a column id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCard {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub kanban_position: Option<RawKanbanPosition>,
    pub attachments: Vec<RawAttachment>,
}

/// Nested column-membership object on a raw card.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawKanbanPosition {
    pub list_id: Option<String>,
    pub position: Option<i64>,
}

/// Raw attachment entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAttachment {
    pub id: Option<String>,
    pub filename: Option<String>,
    #[serde(rename = "downloadLink")]
    pub download_link: Option<String>,
    pub mimetype: Option<String>,
    pub length: Option<i64>,
}

// ============================================================================
// Payload parsing
// ============================================================================

/// Parse a raw board payload from a JSON string.
pub fn parse_payload(json: &str) -> Result<RawBoard> {
    let raw: RawBoard = serde_json::from_str(json)?;
    Ok(raw)
}

/// Read and parse a raw board payload from a file.
pub fn read_payload(path: &Path) -> Result<RawBoard> {
    let content =
        std::fs::read_to_string(path).map_err(|e| crate::error::BoardWatchError::io(path, e))?;
    parse_payload(&content)
}

/// Read and parse a raw board payload from an arbitrary reader (stdin).
pub fn read_payload_from(reader: &mut dyn Read) -> Result<RawBoard> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    parse_payload(&content)
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize a raw payload into a [`Snapshot`] captured at the given time.
#[must_use]
pub fn normalize(raw: &RawBoard, captured_at: DateTime<Utc>) -> Snapshot {
    let mut columns: Vec<Column> = Vec::with_capacity(raw.lists.len());
    for list in &raw.lists {
        let Some(id) = non_empty(&list.id) else {
            debug!("dropping list without id (name={:?})", list.name);
            continue;
        };
        columns.push(Column {
            id,
            name: list.name.clone().unwrap_or_default(),
            position: list.position.unwrap_or(0),
            color: list.color.clone(),
        });
    }
    columns.sort_by_key(|c| c.position);

    let mut column_map: IndexMap<String, Column> = IndexMap::with_capacity(columns.len());
    for column in columns {
        if column_map.insert(column.id.clone(), column).is_some() {
            debug!("duplicate column id in payload, keeping last occurrence");
        }
    }

    let mut card_map: IndexMap<String, Card> = IndexMap::with_capacity(raw.cards.len());
    for raw_card in &raw.cards {
        let Some(id) = non_empty(&raw_card.id) else {
            debug!("dropping card without id (title={:?})", raw_card.title);
            continue;
        };

        let mut attachments: Vec<Attachment> = Vec::with_capacity(raw_card.attachments.len());
        for raw_att in &raw_card.attachments {
            let Some(att_id) = non_empty(&raw_att.id) else {
                debug!(card = %id, "dropping attachment without id");
                continue;
            };
            if attachments.iter().any(|a| a.id == att_id) {
                debug!(card = %id, attachment = %att_id, "duplicate attachment id, keeping first");
                continue;
            }
            attachments.push(Attachment {
                id: att_id,
                filename: raw_att.filename.clone().unwrap_or_default(),
                download_url: raw_att.download_link.clone().unwrap_or_default(),
                mime_type: raw_att.mimetype.clone(),
                length: raw_att.length,
            });
        }

        let card = Card {
            id: id.clone(),
            title: raw_card.title.clone().unwrap_or_default(),
            description: raw_card.description.clone().unwrap_or_default(),
            link: raw_card.link.clone(),
            column_id: raw_card
                .kanban_position
                .as_ref()
                .and_then(|p| non_empty(&p.list_id)),
            position: raw_card.kanban_position.as_ref().and_then(|p| p.position),
            attachments,
        };
        if card_map.insert(id, card).is_some() {
            debug!("duplicate card id in payload, keeping last occurrence");
        }
    }

    Snapshot {
        board_id: raw.id.clone().unwrap_or_default(),
        name: raw.name.clone().unwrap_or_default(),
        description: raw.description.clone().unwrap_or_default(),
        columns: column_map,
        cards: card_map,
        captured_at,
    }
}

/// Treat `None` and `""` identically: both mean "no identifier".
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(String::from)
}

//! Field-level differ for matched cards.
//!
//! Compares tracked attributes (title, description, link, resolved column
//! name) by exact equality and attachment membership as an id-keyed set. A
//! modification record is emitted only when something actually changed.
//!
//! Attachments whose id is unchanged are never reported, even if their
//! filename or length differ: attachment identity is the id, and in-place
//! metadata edits are versioned by the temporal store instead of surfacing
//! in the changeset.

use crate::diff::reconcile::resolved_column;
use crate::diff::result::{CardModified, CardSummary, ColumnSummary};
use crate::model::{Card, Column, Snapshot};
use std::collections::HashMap;

/// Diff one matched card pair. Returns `None` when no tracked attribute
/// changed.
///
/// `column_renames` maps old column names to new ones so a card whose
/// column was merely renamed does not read as moved.
#[must_use]
pub fn diff_card(
    previous: &Snapshot,
    current: &Snapshot,
    prev: &Card,
    curr: &Card,
    column_renames: &HashMap<String, String>,
) -> Option<CardModified> {
    let no_renames = HashMap::new();
    let old_column = resolved_column(previous, prev, column_renames);
    let new_column = resolved_column(current, curr, &no_renames);

    let prev_ids = prev.attachment_ids();
    let curr_ids = curr.attachment_ids();
    let attachments_added: Vec<_> = curr
        .attachments
        .iter()
        .filter(|a| !prev_ids.contains(a.id.as_str()))
        .cloned()
        .collect();
    let attachments_removed: Vec<_> = prev
        .attachments
        .iter()
        .filter(|a| !curr_ids.contains(a.id.as_str()))
        .cloned()
        .collect();

    let changed = prev.title != curr.title
        || prev.description != curr.description
        || prev.link != curr.link
        || old_column != new_column
        || !attachments_added.is_empty()
        || !attachments_removed.is_empty();
    if !changed {
        return None;
    }

    Some(CardModified {
        id: curr.id.clone(),
        old_title: prev.title.clone(),
        new_title: curr.title.clone(),
        old_description: prev.description.clone(),
        new_description: curr.description.clone(),
        old_link: prev.link.clone(),
        new_link: curr.link.clone(),
        old_column,
        new_column,
        attachments_added,
        attachments_removed,
    })
}

/// Build the added/removed summary for a card, column resolved within its
/// own snapshot.
#[must_use]
pub fn summarize_card(snapshot: &Snapshot, card: &Card) -> CardSummary {
    CardSummary {
        id: card.id.clone(),
        title: card.title.clone(),
        description: card.description.clone(),
        link: card.link.clone(),
        column: snapshot.column_name(card).map(String::from),
        attachments: card.attachments.clone(),
    }
}

/// Build the added/removed summary for a column.
#[must_use]
pub fn summarize_column(column: &Column) -> ColumnSummary {
    ColumnSummary {
        id: column.id.clone(),
        name: column.name.clone(),
        position: column.position,
        color: column.color.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attachment;
    use chrono::Utc;

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

    fn attachment(id: &str, filename: &str) -> Attachment {
        Attachment {
            id: id.to_string(),
            filename: filename.to_string(),
            download_url: format!("https://example.test/{id}"),
            mime_type: None,
            length: None,
        }
    }

    fn snapshot(columns: Vec<Column>, cards: Vec<Card>) -> Snapshot {
        Snapshot {
            board_id: "b1".to_string(),
            name: "Board".to_string(),
            description: String::new(),
            columns: columns.into_iter().map(|c| (c.id.clone(), c)).collect(),
            cards: cards.into_iter().map(|c| (c.id.clone(), c)).collect(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_identical_cards_produce_no_record() {
        let snap = snapshot(vec![column("l1", "A", 0)], vec![card_in("c1", "T", Some("l1"))]);
        let card = snap.cards.get("c1").unwrap();
        assert!(diff_card(&snap, &snap, card, card, &HashMap::new()).is_none());
    }

    #[test]
    fn test_modification_carries_old_and_new_for_every_field() {
        let prev = snapshot(vec![column("l1", "A", 0)], vec![card_in("c1", "T", Some("l1"))]);
        let mut changed = card_in("c1", "T2", Some("l1"));
        changed.description = "now described".to_string();
        let curr = snapshot(vec![column("l1", "A", 0)], vec![changed]);

        let m = diff_card(
            &prev,
            &curr,
            prev.cards.get("c1").unwrap(),
            curr.cards.get("c1").unwrap(),
            &HashMap::new(),
        )
        .unwrap();

        assert!(m.title_changed());
        assert_eq!(m.old_title, "T");
        assert_eq!(m.new_title, "T2");
        assert!(m.description_changed());
        // Unchanged fields carry old == new
        assert!(!m.link_changed());
        assert_eq!(m.old_link, m.new_link);
        assert!(!m.column_changed());
        assert_eq!(m.old_column.as_deref(), Some("A"));
        assert_eq!(m.new_column.as_deref(), Some("A"));
    }

    #[test]
    fn test_attachment_set_diff_by_id() {
        let mut prev_card = card_in("c1", "T", None);
        prev_card.attachments = vec![attachment("a1", "one.pdf")];
        let mut curr_card = card_in("c1", "T", None);
        curr_card.attachments = vec![attachment("a1", "one.pdf"), attachment("a2", "two.pdf")];

        let prev = snapshot(vec![], vec![prev_card]);
        let curr = snapshot(vec![], vec![curr_card]);

        let m = diff_card(
            &prev,
            &curr,
            prev.cards.get("c1").unwrap(),
            curr.cards.get("c1").unwrap(),
            &HashMap::new(),
        )
        .unwrap();

        assert_eq!(m.attachments_added.len(), 1);
        assert_eq!(m.attachments_added[0].id, "a2");
        assert!(m.attachments_removed.is_empty());
        // Unrelated fields show old == new
        assert!(!m.title_changed());
        assert!(!m.column_changed());
    }

    #[test]
    fn test_same_id_metadata_edit_not_reported() {
        let mut prev_card = card_in("c1", "T", None);
        prev_card.attachments = vec![attachment("a1", "old-name.pdf")];
        let mut curr_card = card_in("c1", "T", None);
        curr_card.attachments = vec![attachment("a1", "new-name.pdf")];

        let prev = snapshot(vec![], vec![prev_card]);
        let curr = snapshot(vec![], vec![curr_card]);

        assert!(diff_card(
            &prev,
            &curr,
            prev.cards.get("c1").unwrap(),
            curr.cards.get("c1").unwrap(),
            &HashMap::new(),
        )
        .is_none());
    }

    #[test]
    fn test_column_rename_is_not_a_move() {
        let prev = snapshot(vec![column("l1", "To Do", 0)], vec![card_in("c1", "T", Some("l1"))]);
        let curr = snapshot(vec![column("l1", "Backlog", 0)], vec![card_in("c1", "T", Some("l1"))]);
        let renames = HashMap::from([("To Do".to_string(), "Backlog".to_string())]);

        assert!(diff_card(
            &prev,
            &curr,
            prev.cards.get("c1").unwrap(),
            curr.cards.get("c1").unwrap(),
            &renames,
        )
        .is_none());
    }

    #[test]
    fn test_real_move_detected() {
        let cols = vec![column("l1", "To Do", 0), column("l2", "Done", 1)];
        let prev = snapshot(cols.clone(), vec![card_in("c1", "T", Some("l1"))]);
        let curr = snapshot(cols, vec![card_in("c1", "T", Some("l2"))]);

        let m = diff_card(
            &prev,
            &curr,
            prev.cards.get("c1").unwrap(),
            curr.cards.get("c1").unwrap(),
            &HashMap::new(),
        )
        .unwrap();
        assert!(m.column_changed());
        assert!(m.is_move_only());
        assert_eq!(m.old_column.as_deref(), Some("To Do"));
        assert_eq!(m.new_column.as_deref(), Some("Done"));
    }

    #[test]
    fn test_summarize_card_resolves_column() {
        let snap = snapshot(vec![column("l1", "A", 0)], vec![card_in("c1", "T", Some("l1"))]);
        let summary = summarize_card(&snap, snap.cards.get("c1").unwrap());
        assert_eq!(summary.column.as_deref(), Some("A"));
    }
}

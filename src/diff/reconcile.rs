//! Identity reconciliation between two snapshots.
//!
//! The upstream system is known to reassign identifiers when entities are
//! inserted among existing ones, so a pure id-diff reports phantom
//! remove+add pairs for what is really one rename or one move. Matching
//! combines three signals instead:
//!
//! 1. name/title equality partitions each entity kind into
//!    {added, removed, common};
//! 2. structural position separates "everything shifted" from "this thing
//!    moved";
//! 3. identifier coincidence at a shared slot decides rename-vs-replace.
//!
//! Tie-break order: identifier coincidence wins; when identifiers are
//! unavailable or ambiguous the conservative answer is remove+add.
//!
//! Names are required to be unique within one snapshot for name matching to
//! be unambiguous. Duplicates degrade to last-write-wins in the name map (a
//! documented precision limitation, logged at debug level), never an error.

use crate::diff::result::{ColumnMoved, ColumnRenamed};
use crate::model::{Card, Column, Snapshot};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Column-level reconciliation output.
#[derive(Debug, Clone, Default)]
pub struct ColumnReconciliation {
    pub added: Vec<Column>,
    pub removed: Vec<Column>,
    pub renamed: Vec<ColumnRenamed>,
    pub moved: Vec<ColumnMoved>,
    /// old name -> new name, consulted by the card reconciler and differ so
    /// a card whose column was merely renamed is not reported as moved.
    pub rename_map: HashMap<String, String>,
}

/// Card-level reconciliation output.
///
/// `matched` holds (previous, current) pairs — title matches plus the
/// id-coincidence renames promoted out of the added/removed groups. The
/// field differ decides which matched pairs actually changed.
#[derive(Debug, Clone, Default)]
pub struct CardReconciliation {
    pub added: Vec<Card>,
    pub removed: Vec<Card>,
    pub matched: Vec<(Card, Card)>,
}

/// Build a name→entity map, last-write-wins on duplicates.
fn name_index<'a, T>(
    entries: impl Iterator<Item = (&'a str, &'a T)>,
    what: &str,
) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::new();
    for (name, entry) in entries {
        if map.insert(name, entry).is_some() {
            debug!(
                "duplicate {what} '{name}' within one snapshot; \
                 name matching keeps the last occurrence"
            );
        }
    }
    map
}

/// Reconcile columns between two snapshots.
#[must_use]
pub fn reconcile_columns(previous: &Snapshot, current: &Snapshot) -> ColumnReconciliation {
    let prev_by_name = name_index(
        previous.columns.values().map(|c| (c.name.as_str(), c)),
        "column name",
    );
    let curr_by_name = name_index(
        current.columns.values().map(|c| (c.name.as_str(), c)),
        "column name",
    );

    let mut added: Vec<Column> = curr_by_name
        .iter()
        .filter(|(name, _)| !prev_by_name.contains_key(*name))
        .map(|(_, c)| (*c).clone())
        .collect();
    added.sort_by(|a, b| a.position.cmp(&b.position).then(a.name.cmp(&b.name)));

    let mut removed: Vec<Column> = prev_by_name
        .iter()
        .filter(|(name, _)| !curr_by_name.contains_key(*name))
        .map(|(_, c)| (*c).clone())
        .collect();
    removed.sort_by(|a, b| a.position.cmp(&b.position).then(a.name.cmp(&b.name)));

    // Common names: a differing position is a move.
    let mut moved = Vec::new();
    for prev_col in previous.columns.values() {
        let Some(winner) = prev_by_name.get(prev_col.name.as_str()) else {
            continue;
        };
        if winner.id != prev_col.id {
            continue; // duplicate-name loser, excluded from name matching
        }
        if let Some(curr_col) = curr_by_name.get(prev_col.name.as_str()) {
            if prev_col.position != curr_col.position {
                moved.push(ColumnMoved {
                    id: curr_col.id.clone(),
                    name: prev_col.name.clone(),
                    old_position: prev_col.position,
                    new_position: curr_col.position,
                });
            }
        }
    }

    // A removed and an added entry sharing the same slot AND the same
    // identifier collapse into one rename. Differing identifiers at a shared
    // slot stay an independent remove+add pair: the upstream genuinely
    // replaced one entity with an unrelated one.
    let removed_by_pos: HashMap<i64, &Column> =
        removed.iter().map(|c| (c.position, c)).collect();
    let mut renamed = Vec::new();
    let mut renamed_ids: HashSet<String> = HashSet::new();
    for col in &added {
        if let Some(prev_col) = removed_by_pos.get(&col.position) {
            if prev_col.id == col.id {
                renamed.push(ColumnRenamed {
                    id: col.id.clone(),
                    old_name: prev_col.name.clone(),
                    new_name: col.name.clone(),
                    position: col.position,
                });
                renamed_ids.insert(col.id.clone());
            }
        }
    }
    added.retain(|c| !renamed_ids.contains(&c.id));
    removed.retain(|c| !renamed_ids.contains(&c.id));

    let rename_map: HashMap<String, String> = renamed
        .iter()
        .map(|r| (r.old_name.clone(), r.new_name.clone()))
        .collect();

    ColumnReconciliation {
        added,
        removed,
        renamed,
        moved,
        rename_map,
    }
}

/// Reconcile cards between two snapshots, title as the matching key.
///
/// `column_renames` is the map produced by [`reconcile_columns`]; it keeps
/// column renames from being misread as card moves when resolving each
/// card's column.
#[must_use]
pub fn reconcile_cards(
    previous: &Snapshot,
    current: &Snapshot,
    column_renames: &HashMap<String, String>,
) -> CardReconciliation {
    let prev_by_title = name_index(
        previous.cards.values().map(|c| (c.title.as_str(), c)),
        "card title",
    );
    let curr_by_title = name_index(
        current.cards.values().map(|c| (c.title.as_str(), c)),
        "card title",
    );

    let mut matched: Vec<(Card, Card)> = Vec::new();
    for prev_card in previous.cards.values() {
        let Some(winner) = prev_by_title.get(prev_card.title.as_str()) else {
            continue;
        };
        if winner.id != prev_card.id {
            continue;
        }
        if let Some(curr_card) = curr_by_title.get(prev_card.title.as_str()) {
            matched.push((prev_card.clone(), (*curr_card).clone()));
        }
    }

    let mut added: Vec<Card> = current
        .cards
        .values()
        .filter(|c| {
            curr_by_title
                .get(c.title.as_str())
                .is_some_and(|w| w.id == c.id)
                && !prev_by_title.contains_key(c.title.as_str())
        })
        .cloned()
        .collect();

    let mut removed: Vec<Card> = previous
        .cards
        .values()
        .filter(|c| {
            prev_by_title
                .get(c.title.as_str())
                .is_some_and(|w| w.id == c.id)
                && !curr_by_title.contains_key(c.title.as_str())
        })
        .cloned()
        .collect();

    // Id coincidence across the added/removed groups, in the same resolved
    // column, is a title rename of one card rather than a delete+create.
    let no_renames = HashMap::new();
    let removed_by_id: HashMap<&str, usize> = removed
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();
    let mut promoted_removed: HashSet<usize> = HashSet::new();
    let mut promoted_added: HashSet<usize> = HashSet::new();
    for (ai, curr_card) in added.iter().enumerate() {
        let Some(&ri) = removed_by_id.get(curr_card.id.as_str()) else {
            continue;
        };
        let prev_card = &removed[ri];
        let prev_column = resolved_column(previous, prev_card, column_renames);
        let curr_column = resolved_column(current, curr_card, &no_renames);
        if prev_column == curr_column {
            matched.push((prev_card.clone(), curr_card.clone()));
            promoted_removed.insert(ri);
            promoted_added.insert(ai);
        }
    }
    if !promoted_added.is_empty() {
        added = added
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !promoted_added.contains(i))
            .map(|(_, c)| c)
            .collect();
        removed = removed
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !promoted_removed.contains(i))
            .map(|(_, c)| c)
            .collect();
    }

    CardReconciliation {
        added,
        removed,
        matched,
    }
}

/// Resolve a card's column to a display name, mapping old names through the
/// column rename map so a renamed column reads as its new name.
#[must_use]
pub fn resolved_column(
    snapshot: &Snapshot,
    card: &Card,
    renames: &HashMap<String, String>,
) -> Option<String> {
    snapshot
        .column_name(card)
        .map(|name| renames.get(name).cloned().unwrap_or_else(|| name.to_string()))
}

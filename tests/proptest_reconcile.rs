//! Property-based tests for the identity reconciler.
//!
//! Verifies the partition invariants hold across random snapshots: every
//! matching key of both snapshots is accounted for exactly once, and
//! self-comparison is always empty.

use board_watch::diff::{reconcile_cards, reconcile_columns, DiffEngine};
use board_watch::{Card, Column, Snapshot};
use chrono::Utc;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};

fn columns_snapshot(names: &BTreeSet<String>) -> Snapshot {
    let columns = names
        .iter()
        .enumerate()
        .map(|(position, name)| Column {
            id: format!("id-{name}"),
            name: name.clone(),
            position: position as i64,
            color: None,
        })
        .collect::<Vec<_>>();
    Snapshot {
        board_id: "b1".to_string(),
        name: String::new(),
        description: String::new(),
        columns: columns.into_iter().map(|c| (c.id.clone(), c)).collect(),
        cards: Default::default(),
        captured_at: Utc::now(),
    }
}

fn cards_snapshot(titles: &BTreeSet<String>) -> Snapshot {
    let cards = titles
        .iter()
        .map(|title| Card {
            id: format!("id-{title}"),
            title: title.clone(),
            description: String::new(),
            link: None,
            column_id: None,
            position: None,
            attachments: Vec::new(),
        })
        .collect::<Vec<_>>();
    Snapshot {
        board_id: "b1".to_string(),
        name: String::new(),
        description: String::new(),
        columns: Default::default(),
        cards: cards.into_iter().map(|c| (c.id.clone(), c)).collect(),
        captured_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// added ∪ renamed-targets must equal the current-only names, and
    /// removed ∪ renamed-sources the previous-only names, with no overlap.
    #[test]
    fn column_partition_is_complete_and_disjoint(
        prev_names in prop::collection::btree_set("[a-j]{1,3}", 0..8),
        curr_names in prop::collection::btree_set("[a-j]{1,3}", 0..8),
    ) {
        let prev = columns_snapshot(&prev_names);
        let curr = columns_snapshot(&curr_names);
        let rec = reconcile_columns(&prev, &curr);

        let mut curr_only: HashSet<&str> = HashSet::new();
        for column in &rec.added {
            prop_assert!(curr_only.insert(column.name.as_str()), "duplicate in added");
        }
        for renamed in &rec.renamed {
            prop_assert!(curr_only.insert(renamed.new_name.as_str()), "rename target overlaps added");
        }
        let expected_curr_only: HashSet<&str> = curr_names
            .difference(&prev_names)
            .map(String::as_str)
            .collect();
        prop_assert_eq!(curr_only, expected_curr_only);

        let mut prev_only: HashSet<&str> = HashSet::new();
        for column in &rec.removed {
            prop_assert!(prev_only.insert(column.name.as_str()), "duplicate in removed");
        }
        for renamed in &rec.renamed {
            prop_assert!(prev_only.insert(renamed.old_name.as_str()), "rename source overlaps removed");
        }
        let expected_prev_only: HashSet<&str> = prev_names
            .difference(&curr_names)
            .map(String::as_str)
            .collect();
        prop_assert_eq!(prev_only, expected_prev_only);

        // Moves only ever concern common names
        for moved in &rec.moved {
            prop_assert!(prev_names.contains(&moved.name) && curr_names.contains(&moved.name));
        }
    }

    /// Reconciling a snapshot against itself is always empty.
    #[test]
    fn column_self_comparison_is_empty(
        names in prop::collection::btree_set("[a-j]{1,3}", 0..8),
    ) {
        let snap = columns_snapshot(&names);
        let rec = reconcile_columns(&snap, &snap.clone());
        prop_assert!(rec.added.is_empty());
        prop_assert!(rec.removed.is_empty());
        prop_assert!(rec.renamed.is_empty());
        prop_assert!(rec.moved.is_empty());
    }

    /// Renaming a subset of columns in place (ids and slots stable) is
    /// reported as exactly those renames, never as remove+add churn.
    #[test]
    fn stable_id_renames_are_all_detected(
        names in prop::collection::btree_set("[a-j]{1,3}", 1..6),
        mask in prop::collection::vec(any::<bool>(), 6),
    ) {
        let prev = columns_snapshot(&names);
        let mut curr = prev.clone();
        let mut expected = 0usize;
        for (i, column) in curr.columns.values_mut().enumerate() {
            if mask[i] {
                column.name = format!("{}-renamed", column.name);
            }
        }
        for (prev_col, curr_col) in prev.columns.values().zip(curr.columns.values()) {
            if prev_col.name != curr_col.name {
                expected += 1;
            }
        }

        let rec = reconcile_columns(&prev, &curr);
        prop_assert_eq!(rec.renamed.len(), expected);
        prop_assert!(rec.added.is_empty());
        prop_assert!(rec.removed.is_empty());
        prop_assert!(rec.moved.is_empty());
    }

    /// Matched ∪ removed covers every previous title; matched ∪ added every
    /// current title; nothing appears twice.
    #[test]
    fn card_partition_is_complete_and_disjoint(
        prev_titles in prop::collection::btree_set("[a-j]{1,3}", 0..8),
        curr_titles in prop::collection::btree_set("[a-j]{1,3}", 0..8),
    ) {
        let prev = cards_snapshot(&prev_titles);
        let curr = cards_snapshot(&curr_titles);
        let rec = reconcile_cards(&prev, &curr, &HashMap::new());

        let mut prev_seen: HashSet<&str> = HashSet::new();
        let mut curr_seen: HashSet<&str> = HashSet::new();
        for card in &rec.removed {
            prop_assert!(prev_seen.insert(card.title.as_str()));
        }
        for card in &rec.added {
            prop_assert!(curr_seen.insert(card.title.as_str()));
        }
        for (prev_card, curr_card) in &rec.matched {
            prop_assert!(prev_seen.insert(prev_card.title.as_str()));
            prop_assert!(curr_seen.insert(curr_card.title.as_str()));
        }

        let prev_all: HashSet<&str> = prev_titles.iter().map(String::as_str).collect();
        let curr_all: HashSet<&str> = curr_titles.iter().map(String::as_str).collect();
        prop_assert_eq!(prev_seen, prev_all);
        prop_assert_eq!(curr_seen, curr_all);
    }

    /// The assembled changeset for identical snapshots is empty and not a
    /// first run, whatever the board contents.
    #[test]
    fn engine_self_comparison_is_empty(
        titles in prop::collection::btree_set("[a-j]{1,3}", 0..8),
        names in prop::collection::btree_set("[k-t]{1,3}", 0..5),
    ) {
        let mut snap = cards_snapshot(&titles);
        snap.columns = columns_snapshot(&names).columns;
        let changeset = DiffEngine::new().compare(Some(&snap), &snap.clone());
        prop_assert!(!changeset.is_first_run);
        prop_assert!(!changeset.has_changes());
    }
}

// Display-order reconciliation across insert/remove/normalize

use slotgrid::columns::{ColumnSet, GridColumn};

fn build_set(names: &[&str]) -> ColumnSet {
    let mut set = ColumnSet::new();
    for name in names {
        set.push_column(GridColumn::new(*name), None);
    }
    set
}

fn assert_consistent(set: &ColumnSet) {
    let count = set.len();
    assert!(
        set.display_order().is_structurally_valid(count),
        "display table is not a permutation of 0..{count}"
    );
    for col in set.columns() {
        let display = col.display_index().expect("column placed");
        assert_eq!(
            set.display_order().physical_at(display),
            Some(col.index()),
            "table disagrees with column '{}'",
            col.name()
        );
    }
}

#[test]
fn insert_with_unset_display_takes_physical_position() {
    let mut set = ColumnSet::new();
    set.push_column(GridColumn::new("x"), None);
    assert_eq!(set.display_order().as_slice(), &[0]);
    assert_eq!(set.column(0).unwrap().display_index(), Some(0));

    set.push_column(GridColumn::new("y"), Some(0));
    assert_eq!(set.display_order().as_slice(), &[1, 0]);
    assert_eq!(set.column(0).unwrap().display_index(), Some(1));

    set.push_column(GridColumn::new("z"), None);
    assert_eq!(set.display_order().as_slice(), &[1, 0, 2]);
    assert_eq!(set.column(2).unwrap().display_index(), Some(2));
    assert_consistent(&set);
}

#[test]
fn every_mutation_keeps_the_permutation() {
    let mut set = build_set(&["a", "b", "c", "d"]);
    assert_consistent(&set);

    set.insert_column(2, GridColumn::new("e"), Some(0));
    assert_consistent(&set);

    set.remove_column(0);
    assert_consistent(&set);

    set.insert_column(0, GridColumn::new("f"), Some(3));
    assert_consistent(&set);

    set.remove_column(set.len() - 1);
    assert_consistent(&set);
}

#[test]
fn notifications_fire_once_per_moved_column_in_collection_order() {
    let mut set = build_set(&["a", "b", "c"]);

    // inserting at display 0 moves all three existing columns
    let changes = set.insert_column(3, GridColumn::new("d"), Some(0));
    let moved: Vec<&str> = changes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(moved, vec!["a", "b", "c"]);
    for change in &changes {
        // each notification reflects the fully updated table
        assert_eq!(
            set.display_order().physical_at(change.display_index),
            Some(change.index)
        );
    }
}

#[test]
fn removal_notifies_columns_pulled_left() {
    let mut set = build_set(&["a", "b", "c", "d"]);
    let (_removed, changes) = set.remove_column(1).unwrap();
    // c and d each moved one display position left
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|c| c.name == "c" || c.name == "d"));
    assert_consistent(&set);
}

#[test]
fn normalize_is_idempotent_and_silent_on_valid_state() {
    let mut set = build_set(&["a", "b", "c", "d", "e"]);
    set.stage_display_index(1, 4);
    set.stage_display_index(3, 0);
    set.normalize();
    assert_consistent(&set);

    let first = set.display_ordered_names();
    set.normalize();
    assert_eq!(set.display_ordered_names(), first);
    set.normalize();
    assert_eq!(set.display_ordered_names(), first);
}

#[test]
fn normalize_does_not_shuffle_an_untouched_set() {
    let mut set = build_set(&["a", "b", "c"]);
    set.push_column(GridColumn::new("d"), Some(1));
    let before = set.display_ordered_names();
    set.normalize();
    assert_eq!(set.display_ordered_names(), before);
}

#[test]
fn stale_display_values_resolve_against_prior_order() {
    let mut set = build_set(&["a", "b", "c", "d"]);
    // simulate values surviving a remove/insert cycle
    set.stage_display_index(0, 900);
    set.stage_display_index(2, 901);
    set.normalize();
    assert_consistent(&set);
    // stale columns keep their prior positions
    assert_eq!(set.display_ordered_names(), vec!["a", "b", "c", "d"]);
}

#[test]
fn competing_targets_compact_deterministically() {
    let mut set = build_set(&["a", "b", "c", "d"]);
    // three columns compact onto display 1: left-mover, then the column
    // already sitting there, then the right-mover
    set.stage_display_index(0, 1); // right-mover (prior 0)
    set.stage_display_index(3, 1); // left-mover (prior 3)
    set.normalize();
    assert_consistent(&set);
    assert_eq!(set.display_ordered_names(), vec!["d", "b", "a", "c"]);
}

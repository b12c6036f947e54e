use std::cell::Cell;
use std::cmp::Ordering;
use std::rc::Rc;

use tracing::debug;

use crate::columns::column::GridColumn;
use crate::columns::order_table::{derive_prior_order, DisplayOrderTable};

/// Notification for a column whose display position changed during a
/// structural mutation.
///
/// Notifications are flushed in collection order after the display table
/// is fully updated, so an observer never sees a half-adjusted table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChange {
    pub name: String,
    pub index: usize,
    pub display_index: usize,
}

/// Scoped reentrancy guard for structural adjustments.
///
/// Acquired by the mutating call frame; released on every exit path by
/// `Drop`, so an aborted mutation cannot leave the set permanently
/// mid-adjustment. A frame that fails to acquire the scope skips the
/// redundant incremental reconciliation and leaves it to the outer frame.
struct AdjustmentScope {
    flag: Rc<Cell<bool>>,
}

impl AdjustmentScope {
    fn enter(flag: &Rc<Cell<bool>>) -> Option<Self> {
        if flag.get() {
            return None;
        }
        flag.set(true);
        Some(Self {
            flag: Rc::clone(flag),
        })
    }
}

impl Drop for AdjustmentScope {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// The column collection together with its display-order table.
///
/// Incremental mutations (insert/remove) keep the table consistent in
/// place; mutations that bypass incremental tracking are repaired by
/// [`ColumnSet::normalize`]. No operation here ever errors: invalid state
/// is always resolved by falling back to physical order.
#[derive(Default)]
pub struct ColumnSet {
    columns: Vec<GridColumn>,
    order: DisplayOrderTable,
    adjusting: Rc<Cell<bool>>,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&GridColumn> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&GridColumn> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &GridColumn> {
        self.columns.iter()
    }

    /// The display-order table, readable by rendering and layout.
    pub fn display_order(&self) -> &DisplayOrderTable {
        &self.order
    }

    /// Columns in display order. Positions the table cannot resolve are
    /// skipped rather than reported as errors.
    pub fn columns_in_display_order(&self) -> impl Iterator<Item = &GridColumn> {
        self.order
            .as_slice()
            .iter()
            .filter_map(|&physical| self.columns.get(physical))
    }

    /// Column names in display order. Convenient for assertions and debug
    /// output.
    pub fn display_ordered_names(&self) -> Vec<String> {
        self.columns_in_display_order()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn set_width(&mut self, index: usize, width: u16) {
        if let Some(col) = self.columns.get_mut(index) {
            col.width = width;
        }
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) {
        if let Some(col) = self.columns.get_mut(index) {
            col.visible = visible;
        }
    }

    pub(crate) fn column_mut(&mut self, index: usize) -> Option<&mut GridColumn> {
        self.columns.get_mut(index)
    }

    /// Append a column at the end of the collection.
    pub fn push_column(
        &mut self,
        column: GridColumn,
        requested_display: Option<usize>,
    ) -> Vec<ColumnChange> {
        self.insert_column(self.columns.len(), column, requested_display)
    }

    /// Insert a column at physical position `at`.
    ///
    /// A requested display index that is unset or at least the current
    /// column count is replaced by the column's physical position. The
    /// mutation runs in two phases: the display table is fully updated
    /// first, then one change notification per moved column is flushed in
    /// collection order.
    pub fn insert_column(
        &mut self,
        at: usize,
        mut column: GridColumn,
        requested_display: Option<usize>,
    ) -> Vec<ColumnChange> {
        let at = at.min(self.columns.len());
        let display_pos = match requested_display {
            Some(d) if d < self.columns.len() => d,
            _ => at,
        };

        let Some(_scope) = AdjustmentScope::enter(&self.adjusting) else {
            // An adjustment is already in progress further up the stack;
            // attach the column unplaced and let the outer frame reconcile.
            column.index = at;
            column.display_index = None;
            self.columns.insert(at, column);
            self.reindex_from(at);
            return Vec::new();
        };

        // Phase 1: mutate the table and every affected column.
        self.order.bump_physical_from(at);
        for col in &mut self.columns {
            if let Some(d) = col.display_index {
                if d >= display_pos {
                    col.display_index = Some(d + 1);
                    col.display_index_changed = true;
                }
            }
        }
        column.index = at;
        column.display_index = Some(display_pos);
        let name = column.name().to_string();
        self.columns.insert(at, column);
        self.reindex_from(at + 1);
        self.order.insert(display_pos, at);

        debug!(
            target: "column_set",
            "inserted column '{}' at physical {} display {} ({} columns)",
            name, at, display_pos, self.columns.len()
        );

        // Phase 2: flush deferred notifications.
        self.flush_changes()
    }

    /// Remove the column at physical position `at`.
    ///
    /// Mirror of insertion: the table entry is removed, physical
    /// references above the removed index are decremented, display
    /// positions at or after the removed one are pulled back, then
    /// notifications are flushed. A structurally invalid table at entry
    /// degrades to a silent full resynchronization.
    pub fn remove_column(&mut self, at: usize) -> Option<(GridColumn, Vec<ColumnChange>)> {
        if at >= self.columns.len() {
            return None;
        }

        let Some(_scope) = AdjustmentScope::enter(&self.adjusting) else {
            let column = self.columns.remove(at);
            self.reindex_from(at);
            return Some((column, Vec::new()));
        };

        let display_pos = match self.order.display_of(at) {
            Some(d) if self.order.is_structurally_valid(self.columns.len()) => d,
            _ => {
                // The table no longer describes the collection; remove the
                // column and resettle everything from physical order.
                let column = self.columns.remove(at);
                self.reindex_from(at);
                self.normalize_inner();
                debug!(
                    target: "column_set",
                    "removed column '{}' via full resynchronization",
                    column.name()
                );
                return Some((column, Vec::new()));
            }
        };

        self.order.remove(display_pos);
        self.order.drop_physical_above(at);
        let column = self.columns.remove(at);
        self.reindex_from(at);
        for col in &mut self.columns {
            if let Some(d) = col.display_index {
                if d >= display_pos && d > 0 {
                    col.display_index = Some(d - 1);
                    col.display_index_changed = true;
                }
            }
        }

        debug!(
            target: "column_set",
            "removed column '{}' from physical {} display {} ({} columns left)",
            column.name(), at, display_pos, self.columns.len()
        );

        let changes = self.flush_changes();
        Some((column, changes))
    }

    /// Stage a display index for a later [`ColumnSet::normalize`] pass.
    ///
    /// Used by layout restoration and other bulk paths that bypass
    /// incremental tracking. The value is taken as-is; out-of-range values
    /// are tolerated and resolved by the normalize fallback.
    pub fn stage_display_index(&mut self, index: usize, display_index: usize) {
        if let Some(col) = self.columns.get_mut(index) {
            col.display_index = Some(display_index);
        }
    }

    /// Full reconciliation after mutations that bypassed incremental
    /// tracking (bulk replace, reset, restored layout).
    ///
    /// Stable-sorts columns by `(sort key, move direction, prior order,
    /// physical order)`: left-movers land before stationary columns before
    /// right-movers when several columns target the same position, then
    /// prior display order and finally physical order break the remaining
    /// ties. Runs silently: dirty flags are cleared without notifications,
    /// since nothing user-visible reordered.
    pub fn normalize(&mut self) {
        let Some(_scope) = AdjustmentScope::enter(&self.adjusting) else {
            return;
        };
        self.normalize_inner();
    }

    fn normalize_inner(&mut self) {
        let count = self.columns.len();

        // Physical indices first: they anchor both fallbacks below.
        for (i, col) in self.columns.iter_mut().enumerate() {
            col.index = i;
        }

        let prior = derive_prior_order(&self.order, count).into_positions();

        let mut sorted: Vec<usize> = (0..count).collect();
        let columns = &self.columns;
        sorted.sort_by_key(|&physical| {
            let prior_pos = prior[physical];
            let sort_key = match columns[physical].display_index {
                Some(d) if d < count => d,
                _ => prior_pos,
            };
            let move_dir: i8 = match sort_key.cmp(&prior_pos) {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            };
            (sort_key, move_dir, prior_pos, physical)
        });

        for (display, &physical) in sorted.iter().enumerate() {
            self.columns[physical].display_index = Some(display);
            self.columns[physical].display_index_changed = false;
        }
        self.order.rebuild(sorted);

        debug!(target: "column_set", "normalized {} columns", count);
    }

    fn reindex_from(&mut self, start: usize) {
        for i in start..self.columns.len() {
            self.columns[i].index = i;
        }
    }

    fn flush_changes(&mut self) -> Vec<ColumnChange> {
        let mut changes = Vec::new();
        for col in &mut self.columns {
            if col.display_index_changed {
                col.display_index_changed = false;
                if let Some(display_index) = col.display_index {
                    changes.push(ColumnChange {
                        name: col.name().to_string(),
                        index: col.index,
                        display_index,
                    });
                }
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &ColumnSet) -> Vec<String> {
        set.display_ordered_names()
    }

    #[test]
    fn spec_insert_sequence() {
        let mut set = ColumnSet::new();

        let changes = set.push_column(GridColumn::new("x"), None);
        assert!(changes.is_empty());
        assert_eq!(set.display_order().as_slice(), &[0]);
        assert_eq!(set.column(0).unwrap().display_index(), Some(0));

        let changes = set.push_column(GridColumn::new("y"), Some(0));
        assert_eq!(set.display_order().as_slice(), &[1, 0]);
        assert_eq!(set.column(0).unwrap().display_index(), Some(1));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name, "x");
        assert_eq!(changes[0].display_index, 1);

        let changes = set.push_column(GridColumn::new("z"), None);
        assert!(changes.is_empty());
        assert_eq!(set.display_order().as_slice(), &[1, 0, 2]);
        assert_eq!(set.column(2).unwrap().display_index(), Some(2));
        assert_eq!(names(&set), vec!["y", "x", "z"]);
    }

    #[test]
    fn remove_mirrors_insert() {
        let mut set = ColumnSet::new();
        set.push_column(GridColumn::new("a"), None);
        set.push_column(GridColumn::new("b"), Some(0));
        set.push_column(GridColumn::new("c"), None);
        assert_eq!(names(&set), vec!["b", "a", "c"]);

        let (removed, changes) = set.remove_column(1).unwrap();
        assert_eq!(removed.name(), "b");
        assert_eq!(names(&set), vec!["a", "c"]);
        assert_eq!(set.display_order().as_slice(), &[0, 1]);
        // both remaining columns moved left
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn permutation_invariant_over_mixed_mutations() {
        let mut set = ColumnSet::new();
        for i in 0..6 {
            set.push_column(GridColumn::new(format!("c{i}")), None);
        }
        set.insert_column(2, GridColumn::new("mid"), Some(1));
        set.remove_column(4);
        set.insert_column(0, GridColumn::new("head"), Some(5));
        set.remove_column(0);

        let count = set.len();
        assert!(set.display_order().is_structurally_valid(count));
        for col in set.columns() {
            let d = col.display_index().unwrap();
            assert_eq!(set.display_order().physical_at(d), Some(col.index()));
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut set = ColumnSet::new();
        for i in 0..5 {
            set.push_column(GridColumn::new(format!("c{i}")), None);
        }
        set.stage_display_index(0, 3);
        set.stage_display_index(4, 0);
        set.normalize();
        let first: Vec<_> = set.columns().map(|c| c.display_index()).collect();
        set.normalize();
        let second: Vec<_> = set.columns().map(|c| c.display_index()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn normalize_without_reorder_is_a_no_op() {
        let mut set = ColumnSet::new();
        set.push_column(GridColumn::new("a"), None);
        set.push_column(GridColumn::new("b"), Some(0));
        set.push_column(GridColumn::new("c"), None);
        let before = names(&set);
        set.normalize();
        assert_eq!(names(&set), before);
    }

    #[test]
    fn stale_display_index_falls_back_to_prior_order() {
        let mut set = ColumnSet::new();
        for i in 0..4 {
            set.push_column(GridColumn::new(format!("c{i}")), None);
        }
        // stale value surviving a remove/insert cycle
        set.stage_display_index(2, 17);
        set.normalize();
        assert!(set.display_order().is_structurally_valid(4));
        // the stale column keeps its prior position
        assert_eq!(set.column(2).unwrap().display_index(), Some(2));
    }

    #[test]
    fn requested_display_at_or_past_count_uses_physical() {
        let mut set = ColumnSet::new();
        set.push_column(GridColumn::new("a"), None);
        set.push_column(GridColumn::new("b"), None);
        // requested 2 >= current count 2: falls back to physical position 1
        set.insert_column(1, GridColumn::new("c"), Some(2));
        assert_eq!(set.column(1).unwrap().display_index(), Some(1));
        assert!(set.display_order().is_structurally_valid(3));
    }
}

use tracing::debug;

use crate::provider::RowProvider;
use crate::slots::groups::{
    descendant_groups, flatten_group_specs, root_groups, visible_descendant_slots, GroupChildren,
    GroupSpec, HeaderTable, RowGroup, RowGroupInfo,
};
use crate::slots::run_map::SlotRunMap;
use crate::slots::tree::{HierarchyStore, TreeSpec};

/// What a slot currently addresses. Produced by one classification pass
/// and consumed by exhaustive matching; the header table is consulted
/// before row and tree lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// A group header; the payload is the group id.
    GroupHeader(usize),
    /// A data row; the payload is the flat source row index.
    DataRow(usize),
    /// Nothing addressable at this slot.
    Unaddressed,
}

/// Which shape the slot space is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Shape {
    #[default]
    Unbound,
    Flat,
    Grouped,
    Hierarchy,
}

/// Plan entry for materializing a group segment into slots.
enum SegmentItem {
    Header(usize),
    Rows { start: usize, len: usize },
}

/// The unified row-addressing coordinate.
///
/// Flat data rows, group headers, and hierarchy nodes share one
/// contiguous, monotonic slot space. Collapsing removes the affected
/// entries from the range entirely; expanding inserts them back. The
/// space never owns the underlying data, only the addressing.
#[derive(Default)]
pub struct SlotSpace {
    shape: Shape,
    groups_as_nodes: bool,
    slot_count: usize,
    row_count: usize,
    /// slot <-> flat source row, in flat and grouped shapes.
    rows: SlotRunMap,
    /// slot <-> hierarchy node, in hierarchical shapes.
    nodes: SlotRunMap,
    headers: HeaderTable,
    groups: Vec<RowGroup>,
    tree: Option<HierarchyStore>,
}

impl SlotSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Whether a hierarchical (node-indexed) source is bound.
    pub fn is_hierarchical(&self) -> bool {
        self.shape == Shape::Hierarchy
    }

    /// Whether group headers are addressed through node indexing. Every
    /// consumer picking a toggle implementation checks this first.
    pub fn groups_as_nodes(&self) -> bool {
        self.groups_as_nodes
    }

    pub fn group(&self, gid: usize) -> Option<&RowGroup> {
        self.groups.get(gid)
    }

    pub fn header_info(&self, gid: usize) -> Option<&RowGroupInfo> {
        self.headers.info(gid)
    }

    pub fn hierarchy(&self) -> Option<&HierarchyStore> {
        self.tree.as_ref()
    }

    // ------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------

    /// Bind a flat, ungrouped source: slots are the rows.
    pub fn bind_rows(&mut self, row_count: usize) {
        self.reset();
        self.shape = Shape::Flat;
        self.row_count = row_count;
        self.rows.insert_run(0, 0, row_count);
        self.slot_count = row_count;
        debug!(target: "slot_space", "bound {} flat rows", row_count);
    }

    /// Rebind the flat shape from a data source.
    pub fn refresh_from(&mut self, provider: &dyn RowProvider) {
        self.bind_rows(provider.row_count());
    }

    /// Bind a grouped source. Headers are addressed through the legacy
    /// group path.
    pub fn bind_groups(&mut self, specs: Vec<GroupSpec>, row_count: usize) {
        self.reset();
        self.shape = Shape::Grouped;
        self.row_count = row_count;
        self.groups = flatten_group_specs(specs);
        self.headers.rebind(&self.groups);

        let mut plan = Vec::new();
        for &root in &root_groups(&self.groups) {
            plan.push(SegmentItem::Header(root));
            if self.groups[root].is_expanded {
                plan_group_children(&self.groups, root, &mut plan);
            }
        }
        self.apply_segment(0, &plan);
        debug!(
            target: "slot_space",
            "bound {} rows in {} groups ({} slots)",
            row_count,
            self.groups.len(),
            self.slot_count
        );
    }

    /// Bind a grouped source with headers addressed as hierarchy nodes.
    /// Toggling a header then goes through the node path, not the legacy
    /// group path.
    pub fn bind_groups_as_nodes(
        &mut self,
        specs: Vec<GroupSpec>,
        row_count: usize,
        row_key: &dyn Fn(usize) -> String,
    ) {
        self.reset();
        self.shape = Shape::Hierarchy;
        self.groups_as_nodes = true;
        self.row_count = row_count;
        self.groups = flatten_group_specs(specs);
        self.headers.rebind(&self.groups);

        let roots = root_groups(&self.groups);
        let (tree, group_nodes) = HierarchyStore::from_group_forest(&self.groups, &roots, row_key);
        for (gid, &node) in group_nodes.iter().enumerate() {
            self.headers.bind_node(gid, node);
        }
        self.tree = Some(tree);
        self.materialize_visible_nodes();
        debug!(
            target: "slot_space",
            "bound {} rows as {} group nodes ({} slots)",
            row_count,
            self.groups.len(),
            self.slot_count
        );
    }

    /// Bind a tree-shaped source. Node indices are the tree's own flat
    /// ordering; each node carries one source row.
    pub fn bind_tree(&mut self, roots: Vec<TreeSpec>) {
        self.reset();
        self.shape = Shape::Hierarchy;
        let tree = HierarchyStore::from_specs(roots);
        self.row_count = tree.len();
        self.tree = Some(tree);
        self.materialize_visible_nodes();
        debug!(
            target: "slot_space",
            "bound tree with {} nodes ({} slots)",
            self.row_count,
            self.slot_count
        );
    }

    fn reset(&mut self) {
        self.shape = Shape::Unbound;
        self.groups_as_nodes = false;
        self.slot_count = 0;
        self.row_count = 0;
        self.rows.clear();
        self.nodes.clear();
        self.headers.clear();
        self.groups.clear();
        self.tree = None;
    }

    /// Rebuild the node map (and, in groups-as-nodes shape, the header
    /// table) from current expansion state.
    fn materialize_visible_nodes(&mut self) {
        let Some(tree) = &self.tree else {
            return;
        };
        let mut visible = Vec::new();
        for root in tree.roots() {
            visible.push(root);
            if tree.is_expanded(root) {
                tree.visit_visible_descendants(root, &mut |n| visible.push(n));
            }
        }

        let mut slot = 0;
        for (start, len) in compress_consecutive(&visible) {
            self.nodes.insert_run(slot, start, len);
            slot += len;
        }
        self.slot_count = visible.len();

        if self.groups_as_nodes {
            for (slot, &node) in visible.iter().enumerate() {
                if let Some(gid) = tree.node(node).and_then(|n| n.group) {
                    self.headers.show(gid, slot);
                }
            }
        }
    }

    /// Materialize a planned group segment starting at `slot`.
    fn apply_segment(&mut self, slot: usize, plan: &[SegmentItem]) {
        let mut at = slot;
        for item in plan {
            match *item {
                SegmentItem::Header(gid) => {
                    self.headers.show(gid, at);
                    at += 1;
                }
                SegmentItem::Rows { start, len } => {
                    self.rows.insert_run(at, start, len);
                    at += len;
                }
            }
        }
        self.slot_count += at - slot;
    }

    // ------------------------------------------------------------------
    // Expand / collapse
    // ------------------------------------------------------------------

    /// Collapse a hierarchy node: the contiguous run of every currently
    /// addressable descendant leaves the slot space in one operation,
    /// regardless of each descendant's own expand state. Returns the
    /// number of slots removed.
    pub fn collapse_node(&mut self, node: usize) -> usize {
        let Some(tree) = &mut self.tree else {
            return 0;
        };
        if !tree.is_expanded(node) {
            return 0;
        }
        let removed = match self.nodes.slot_of_entry(node) {
            Some(slot) => {
                let count = tree.visible_descendant_count(node);
                self.nodes.remove_slot_range(slot + 1, count);
                self.headers.collapse_range(slot + 1, count);
                self.slot_count -= count;
                count
            }
            // Not addressable (an ancestor is collapsed): state only.
            None => 0,
        };
        tree.set_expanded(node, false);
        debug!(target: "slot_space", "collapsed node {} ({} slots)", node, removed);
        removed
    }

    /// Expand a hierarchy node: one slot per newly addressable
    /// descendant is inserted immediately after the node's own slot,
    /// recursing into descendants that are already expanded. Returns the
    /// number of slots inserted.
    pub fn expand_node(&mut self, node: usize) -> usize {
        let Some(tree) = &mut self.tree else {
            return 0;
        };
        if tree.is_expanded(node) {
            return 0;
        }
        tree.set_expanded(node, true);
        let Some(slot) = self.nodes.slot_of_entry(node) else {
            return 0;
        };

        let mut revealed = Vec::new();
        tree.visit_visible_descendants(node, &mut |n| revealed.push(n));
        let count = revealed.len();
        if count == 0 {
            return 0;
        }

        self.headers.open_gap(slot + 1, count);
        let mut at = slot + 1;
        for (start, len) in compress_consecutive(&revealed) {
            self.nodes.insert_run(at, start, len);
            at += len;
        }
        if self.groups_as_nodes {
            for (offset, &n) in revealed.iter().enumerate() {
                if let Some(gid) = tree.node(n).and_then(|t| t.group) {
                    self.headers.show(gid, slot + 1 + offset);
                }
            }
        }
        self.slot_count += count;
        debug!(target: "slot_space", "expanded node {} ({} slots)", node, count);
        count
    }

    /// Set a node and its entire subtree to one expansion state.
    pub fn set_subtree_expanded(&mut self, node: usize, expanded: bool) -> usize {
        let Some(tree) = &mut self.tree else {
            return 0;
        };
        let Some(target) = tree.node(node) else {
            return 0;
        };
        let subtree_len = target.subtree_len;

        let slot = self.nodes.slot_of_entry(node);

        // Remove whatever is currently addressable below the node.
        if let Some(slot) = slot {
            if tree.is_expanded(node) {
                let count = tree.visible_descendant_count(node);
                self.nodes.remove_slot_range(slot + 1, count);
                self.headers.collapse_range(slot + 1, count);
                self.slot_count -= count;
            }
        }

        tree.set_subtree_expanded(node, expanded);

        // Reinsert under the new state: a fully expanded subtree is one
        // contiguous node range.
        let mut inserted = 0;
        if let Some(slot) = slot {
            if expanded && subtree_len > 1 {
                inserted = subtree_len - 1;
                self.headers.open_gap(slot + 1, inserted);
                self.nodes.insert_run(slot + 1, node + 1, inserted);
                if self.groups_as_nodes {
                    if let Some(tree) = self.tree.as_ref() {
                        for offset in 0..inserted {
                            let n = node + 1 + offset;
                            if let Some(gid) = tree.node(n).and_then(|t| t.group) {
                                self.headers.show(gid, slot + 1 + offset);
                            }
                        }
                    }
                }
                self.slot_count += inserted;
            }
        }
        debug!(
            target: "slot_space",
            "set subtree of node {} expanded={} ({} slots)",
            node, expanded, inserted
        );
        inserted
    }

    /// Collapse a group through the legacy header path. Returns the
    /// number of slots removed.
    pub fn collapse_group(&mut self, gid: usize) -> usize {
        if gid >= self.groups.len() || !self.groups[gid].is_expanded {
            return 0;
        }
        let visible = self
            .headers
            .info(gid)
            .map(|info| (info.is_visible, info.slot));
        let removed = match visible {
            Some((true, header_slot)) => {
                let count = visible_descendant_slots(&self.groups, gid);
                self.rows.remove_slot_range(header_slot + 1, count);
                self.headers.collapse_range(header_slot + 1, count);
                self.slot_count -= count;
                count
            }
            _ => 0,
        };
        self.groups[gid].is_expanded = false;
        debug!(target: "slot_space", "collapsed group {} ({} slots)", gid, removed);
        removed
    }

    /// Expand a group through the legacy header path. Returns the number
    /// of slots inserted.
    pub fn expand_group(&mut self, gid: usize) -> usize {
        if gid >= self.groups.len() || self.groups[gid].is_expanded {
            return 0;
        }
        self.groups[gid].is_expanded = true;
        let Some(info) = self.headers.info(gid) else {
            return 0;
        };
        if !info.is_visible {
            return 0;
        }
        let header_slot = info.slot;

        let mut plan = Vec::new();
        plan_group_children(&self.groups, gid, &mut plan);
        let count = segment_len(&plan);
        if count == 0 {
            return 0;
        }

        self.headers.open_gap(header_slot + 1, count);
        let before = self.slot_count;
        self.apply_segment(header_slot + 1, &plan);
        debug_assert_eq!(self.slot_count, before + count);
        debug!(target: "slot_space", "expanded group {} ({} slots)", gid, count);
        count
    }

    /// Set a group and all its descendant groups to one expansion state
    /// through the legacy path.
    pub fn set_group_subtree_expanded(&mut self, gid: usize, expanded: bool) -> usize {
        if gid >= self.groups.len() {
            return 0;
        }
        // Take the whole visible segment down, restate, rebuild.
        self.collapse_group(gid);
        let mut descendants = Vec::new();
        descendant_groups(&self.groups, gid, &mut descendants);
        for id in descendants {
            self.groups[id].is_expanded = expanded;
        }
        if expanded {
            self.expand_group(gid)
        } else {
            0
        }
    }

    // ------------------------------------------------------------------
    // Source row mutations
    // ------------------------------------------------------------------

    /// `count` rows were inserted into the source at `row`. Slots are
    /// created only where the insertion point is currently addressable;
    /// rows arriving inside a collapsed region become addressable when it
    /// expands. Hierarchical shapes rebind instead.
    pub fn insert_source_rows(&mut self, row: usize, count: usize) {
        if count == 0 {
            return;
        }
        match self.shape {
            Shape::Unbound => {}
            Shape::Flat => {
                self.row_count += count;
                self.rows.clear();
                self.rows.insert_run(0, 0, self.row_count);
                self.slot_count = self.row_count;
            }
            Shape::Grouped => {
                self.insert_grouped_rows(row, count);
            }
            Shape::Hierarchy => {
                debug_assert!(false, "hierarchical sources rebind on row insertion");
            }
        }
    }

    /// `count` rows were removed from the source starting at `row`.
    pub fn remove_source_rows(&mut self, row: usize, count: usize) {
        if count == 0 {
            return;
        }
        match self.shape {
            Shape::Unbound => {}
            Shape::Flat => {
                self.row_count = self.row_count.saturating_sub(count);
                self.rows.clear();
                self.rows.insert_run(0, 0, self.row_count);
                self.slot_count = self.row_count;
            }
            Shape::Grouped => {
                self.remove_grouped_rows(row, count);
            }
            Shape::Hierarchy => {
                debug_assert!(false, "hierarchical sources rebind on row removal");
            }
        }
    }

    fn insert_grouped_rows(&mut self, row: usize, count: usize) {
        // Attach the insertion to the leaf range containing `row`, or
        // failing that the leaf whose range ends exactly there.
        let mut owner = None;
        for (gid, group) in self.groups.iter().enumerate() {
            if let GroupChildren::Rows(r) = &group.children {
                if r.start <= row && row < r.end {
                    owner = Some(gid);
                    break;
                }
                if owner.is_none() && r.end == row {
                    owner = Some(gid);
                }
            }
        }

        for (gid, group) in self.groups.iter_mut().enumerate() {
            if let GroupChildren::Rows(r) = &mut group.children {
                if owner == Some(gid) {
                    r.end += count;
                } else if r.start >= row {
                    r.start += count;
                    r.end += count;
                }
            }
        }

        self.rows.shift_entries_from(row, count as isize);
        self.row_count += count;

        let Some(owner) = owner else {
            return;
        };
        let (owner_start, owner_end) = match &self.groups[owner].children {
            GroupChildren::Rows(r) => (r.start, r.end),
            GroupChildren::Groups(_) => return,
        };

        // Where do the new rows land, if anywhere addressable?
        let slot = if row > owner_start {
            // Middle or end of the owner's range: right after the row
            // that precedes the insertion point.
            self.rows.slot_of_entry(row - 1).map(|s| s + 1)
        } else if owner_end - count > row {
            // Front of a non-empty range: where its first row sat.
            self.rows.slot_of_entry(row + count)
        } else {
            // Previously empty group: right after its header, when the
            // header is addressable and the group expanded.
            self.headers
                .info(owner)
                .filter(|info| info.is_visible && self.groups[owner].is_expanded)
                .map(|info| info.slot + 1)
        };

        if let Some(slot) = slot {
            self.rows.insert_run(slot, row, count);
            self.headers.open_gap(slot, count);
            self.slot_count += count;
        }
        debug!(
            target: "slot_space",
            "inserted {} source rows at {} (owner group {:?})",
            count, row, owner
        );
    }

    fn remove_grouped_rows(&mut self, row: usize, count: usize) {
        let fragments = self.rows.slots_of_entry_range(row, count);
        for &(slot, len) in fragments.iter().rev() {
            self.rows.remove_slot_range(slot, len);
            self.headers.collapse_range(slot, len);
            self.slot_count -= len;
        }
        self.rows.shift_entries_from(row + count, -(count as isize));

        let clamp = |x: usize| {
            if x <= row {
                x
            } else if x >= row + count {
                x - count
            } else {
                row
            }
        };
        for group in &mut self.groups {
            if let GroupChildren::Rows(r) = &mut group.children {
                *r = clamp(r.start)..clamp(r.end);
            }
        }
        self.row_count = self.row_count.saturating_sub(count);
        debug!(target: "slot_space", "removed {} source rows at {}", count, row);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Classify what `slot` addresses. Header table first, then row or
    /// node lookup.
    pub fn classify_slot(&self, slot: usize) -> SlotKind {
        if slot >= self.slot_count {
            return SlotKind::Unaddressed;
        }
        if let Some(info) = self.headers.header_at_slot(slot) {
            return SlotKind::GroupHeader(info.group);
        }
        match self.shape {
            Shape::Flat | Shape::Grouped => self
                .rows
                .entry_at_slot(slot)
                .map_or(SlotKind::Unaddressed, SlotKind::DataRow),
            Shape::Hierarchy => self
                .nodes
                .entry_at_slot(slot)
                .and_then(|n| self.tree.as_ref()?.node(n)?.row)
                .map_or(SlotKind::Unaddressed, SlotKind::DataRow),
            Shape::Unbound => SlotKind::Unaddressed,
        }
    }

    /// The data row addressed by `slot`, if it is a row slot.
    pub fn row_at_slot(&self, slot: usize) -> Option<usize> {
        match self.classify_slot(slot) {
            SlotKind::DataRow(row) => Some(row),
            SlotKind::GroupHeader(_) | SlotKind::Unaddressed => None,
        }
    }

    /// The slot addressing a flat source row, if it is addressable.
    pub fn slot_of_row(&self, row: usize) -> Option<usize> {
        match self.shape {
            Shape::Flat | Shape::Grouped => self.rows.slot_of_entry(row),
            Shape::Hierarchy => {
                let node = self.tree.as_ref()?.node_of_row(row)?;
                self.nodes.slot_of_entry(node)
            }
            Shape::Unbound => None,
        }
    }

    /// The hierarchy node addressed by `slot`.
    pub fn node_at_slot(&self, slot: usize) -> Option<usize> {
        if slot >= self.slot_count {
            return None;
        }
        self.nodes.entry_at_slot(slot)
    }

    /// The slot addressing a hierarchy node, if it is addressable.
    pub fn slot_of_node(&self, node: usize) -> Option<usize> {
        self.nodes.slot_of_entry(node)
    }

    pub fn is_expanded(&self, node: usize) -> bool {
        self.tree.as_ref().is_some_and(|t| t.is_expanded(node))
    }

    /// Keys of the currently expanded groups or parent nodes, for layout
    /// persistence.
    pub fn expanded_keys(&self) -> Vec<String> {
        match self.shape {
            Shape::Hierarchy => self
                .tree
                .as_ref()
                .map(|t| t.expanded_keys())
                .unwrap_or_default(),
            Shape::Grouped => self
                .groups
                .iter()
                .filter(|g| g.is_expanded)
                .map(|g| g.key.clone())
                .collect(),
            Shape::Flat | Shape::Unbound => Vec::new(),
        }
    }

    /// Replay a persisted expansion set: everything named expands,
    /// everything else collapses. Parents are processed before their
    /// descendants so intermediate states never leak slots.
    pub fn apply_expanded_keys(&mut self, keys: &[String]) {
        let wanted: std::collections::HashSet<&str> = keys.iter().map(|k| k.as_str()).collect();
        match self.shape {
            Shape::Grouped => {
                for gid in 0..self.groups.len() {
                    let desired = wanted.contains(self.groups[gid].key.as_str());
                    if self.groups[gid].is_expanded != desired {
                        if desired {
                            self.expand_group(gid);
                        } else {
                            self.collapse_group(gid);
                        }
                    }
                }
            }
            Shape::Hierarchy => {
                let len = self.tree.as_ref().map(|t| t.len()).unwrap_or(0);
                for node in 0..len {
                    let state = self.tree.as_ref().and_then(|tree| {
                        let n = tree.node(node)?;
                        n.has_children()
                            .then(|| (n.is_expanded, wanted.contains(n.key.as_str())))
                    });
                    match state {
                        Some((false, true)) => {
                            self.expand_node(node);
                        }
                        Some((true, false)) => {
                            self.collapse_node(node);
                        }
                        _ => {}
                    }
                }
            }
            Shape::Flat | Shape::Unbound => {}
        }
    }
}

/// Plan the slot segment produced by an expanded group's children:
/// each child row range, one header per subgroup, recursing only into
/// expanded subgroups.
fn plan_group_children(groups: &[RowGroup], gid: usize, out: &mut Vec<SegmentItem>) {
    match &groups[gid].children {
        GroupChildren::Rows(range) => {
            if !range.is_empty() {
                out.push(SegmentItem::Rows {
                    start: range.start,
                    len: range.len(),
                });
            }
        }
        GroupChildren::Groups(ids) => {
            for &id in ids {
                out.push(SegmentItem::Header(id));
                if groups[id].is_expanded {
                    plan_group_children(groups, id, out);
                }
            }
        }
    }
}

fn segment_len(plan: &[SegmentItem]) -> usize {
    plan.iter()
        .map(|item| match item {
            SegmentItem::Header(_) => 1,
            SegmentItem::Rows { len, .. } => *len,
        })
        .sum()
}

/// Compress ascending indices into `(start, len)` runs of consecutive
/// values.
fn compress_consecutive(indices: &[usize]) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &i in indices {
        match runs.last_mut() {
            Some((start, len)) if *start + *len == i => *len += 1,
            _ => runs.push((i, 1)),
        }
    }
    runs
}

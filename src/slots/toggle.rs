use tracing::debug;

use crate::slots::address_space::{SlotKind, SlotSpace};

/// Unified result for expand/collapse dispatch.
///
/// Failure means nothing changed: the slot was out of range, the header
/// had no bound group, or no hierarchical source is bound. Never a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResult {
    /// Whether any state changed.
    pub success: bool,
    /// Human-readable description for status surfaces.
    pub description: String,
    /// The entity's expansion state after the operation, when resolved.
    pub expanded: Option<bool>,
    /// Net slot-count change (positive for expansion).
    pub slots_delta: isize,
}

impl ToggleResult {
    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            success: false,
            description: description.into(),
            expanded: None,
            slots_delta: 0,
        }
    }

    pub fn toggled(description: impl Into<String>, expanded: bool, slots_delta: isize) -> Self {
        Self {
            success: true,
            description: description.into(),
            expanded: Some(expanded),
            slots_delta,
        }
    }
}

impl SlotSpace {
    /// Resolve `slot` to a toggleable entity and flip it.
    ///
    /// Classification is exhaustive: a header bound to a node (when group
    /// headers are addressed as nodes), a header on the legacy group
    /// path, or a data row resolved to its hierarchy node. With
    /// `toggle_subtree`, the entire subtree is set to the complement of
    /// the target's own current state.
    pub fn toggle_at_slot(&mut self, slot: usize, toggle_subtree: bool) -> ToggleResult {
        if slot >= self.slot_count() {
            return ToggleResult::failure(format!(
                "slot {} out of range ({} slots)",
                slot,
                self.slot_count()
            ));
        }

        let result = match self.classify_slot(slot) {
            SlotKind::GroupHeader(gid) => {
                if self.groups_as_nodes() {
                    match self.header_info(gid).and_then(|info| info.node) {
                        Some(node) => self.toggle_node(node, toggle_subtree),
                        None => ToggleResult::failure(format!(
                            "header for group {} has no bound node",
                            gid
                        )),
                    }
                } else {
                    self.toggle_group(gid, toggle_subtree)
                }
            }
            SlotKind::DataRow(row) => {
                if !self.is_hierarchical() {
                    ToggleResult::failure("no hierarchical source bound")
                } else {
                    match self.hierarchy().and_then(|t| t.node_of_row(row)) {
                        Some(node) => self.toggle_node(node, toggle_subtree),
                        None => {
                            ToggleResult::failure(format!("row {} is not bound to a node", row))
                        }
                    }
                }
            }
            SlotKind::Unaddressed => {
                ToggleResult::failure(format!("slot {} addresses nothing toggleable", slot))
            }
        };

        debug!(
            target: "slot_toggle",
            "toggle slot {} subtree={} -> {} ({})",
            slot, toggle_subtree, result.success, result.description
        );
        result
    }

    fn toggle_node(&mut self, node: usize, toggle_subtree: bool) -> ToggleResult {
        let was_expanded = self.is_expanded(node);
        if toggle_subtree {
            let target = !was_expanded;
            let before = self.slot_count();
            self.set_subtree_expanded(node, target);
            let moved = self.slot_count() as isize - before as isize;
            ToggleResult::toggled(
                format!(
                    "subtree of node {} {}",
                    node,
                    if target { "expanded" } else { "collapsed" }
                ),
                target,
                moved,
            )
        } else if was_expanded {
            let removed = self.collapse_node(node);
            ToggleResult::toggled(format!("node {} collapsed", node), false, -(removed as isize))
        } else {
            let inserted = self.expand_node(node);
            ToggleResult::toggled(format!("node {} expanded", node), true, inserted as isize)
        }
    }

    fn toggle_group(&mut self, gid: usize, toggle_subtree: bool) -> ToggleResult {
        let Some(group) = self.group(gid) else {
            return ToggleResult::failure(format!("no group {}", gid));
        };
        let key = group.key.clone();
        let was_expanded = group.is_expanded;
        if toggle_subtree {
            let target = !was_expanded;
            let before = self.slot_count();
            self.set_group_subtree_expanded(gid, target);
            let delta = self.slot_count() as isize - before as isize;
            ToggleResult::toggled(
                format!(
                    "group '{}' subtree {}",
                    key,
                    if target { "expanded" } else { "collapsed" }
                ),
                target,
                delta,
            )
        } else if was_expanded {
            let removed = self.collapse_group(gid);
            ToggleResult::toggled(
                format!("group '{}' collapsed", key),
                false,
                -(removed as isize),
            )
        } else {
            let inserted = self.expand_group(gid);
            ToggleResult::toggled(format!("group '{}' expanded", key), true, inserted as isize)
        }
    }
}

use std::ops::Range;

/// Caller-facing description of one group, nested the way the data source
/// groups its rows. Sibling specs must cover ascending, non-overlapping
/// row ranges so that slot and row coordinates stay monotonic together.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub key: String,
    pub expanded: bool,
    pub kind: GroupSpecKind,
}

#[derive(Debug, Clone)]
pub enum GroupSpecKind {
    /// Leaf group owning a contiguous range of flat source rows.
    Rows(Range<usize>),
    /// Parent group owning subgroups.
    Groups(Vec<GroupSpec>),
}

impl GroupSpec {
    pub fn leaf(key: impl Into<String>, rows: Range<usize>) -> Self {
        Self {
            key: key.into(),
            expanded: true,
            kind: GroupSpecKind::Rows(rows),
        }
    }

    pub fn parent(key: impl Into<String>, children: Vec<GroupSpec>) -> Self {
        Self {
            key: key.into(),
            expanded: true,
            kind: GroupSpecKind::Groups(children),
        }
    }

    pub fn collapsed(mut self) -> Self {
        self.expanded = false;
        self
    }
}

/// Immediate children of a bound group: either a contiguous range of flat
/// source rows or the ids of its subgroups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupChildren {
    Rows(Range<usize>),
    Groups(Vec<usize>),
}

/// One bound row group. Groups live in a preorder vector; a group id is
/// its vector position and acts as a non-owning handle everywhere else.
#[derive(Debug, Clone)]
pub struct RowGroup {
    pub key: String,
    pub level: usize,
    pub parent: Option<usize>,
    pub children: GroupChildren,
    pub is_expanded: bool,
}

/// Header bookkeeping for one group: the slot its header occupies while
/// addressable, and whether it currently is.
#[derive(Debug, Clone)]
pub struct RowGroupInfo {
    /// Non-owning handle into the bound group vector.
    pub group: usize,
    pub level: usize,
    /// Slot of the header. Stale while `is_visible` is false.
    pub slot: usize,
    pub is_visible: bool,
    /// Bound hierarchy node when group headers are addressed as nodes.
    pub node: Option<usize>,
}

/// Flatten nested specs into the preorder group vector.
pub fn flatten_group_specs(specs: Vec<GroupSpec>) -> Vec<RowGroup> {
    fn push(
        spec: GroupSpec,
        level: usize,
        parent: Option<usize>,
        out: &mut Vec<RowGroup>,
    ) -> usize {
        let id = out.len();
        out.push(RowGroup {
            key: spec.key,
            level,
            parent,
            children: GroupChildren::Rows(0..0),
            is_expanded: spec.expanded,
        });
        let children = match spec.kind {
            GroupSpecKind::Rows(range) => GroupChildren::Rows(range),
            GroupSpecKind::Groups(subs) => {
                let mut ids = Vec::with_capacity(subs.len());
                for sub in subs {
                    ids.push(push(sub, level + 1, Some(id), out));
                }
                GroupChildren::Groups(ids)
            }
        };
        out[id].children = children;
        id
    }

    let mut groups = Vec::new();
    for spec in specs {
        push(spec, 0, None, &mut groups);
    }
    groups
}

/// Ids of the root groups, in order.
pub fn root_groups(groups: &[RowGroup]) -> Vec<usize> {
    groups
        .iter()
        .enumerate()
        .filter(|(_, g)| g.parent.is_none())
        .map(|(id, _)| id)
        .collect()
}

/// Number of slots the descendants of `gid` currently occupy when the
/// group itself is expanded and addressable: every child row range plus
/// one header per subgroup, recursing only into expanded subgroups.
pub fn visible_descendant_slots(groups: &[RowGroup], gid: usize) -> usize {
    match &groups[gid].children {
        GroupChildren::Rows(range) => range.len(),
        GroupChildren::Groups(ids) => ids
            .iter()
            .map(|&id| {
                1 + if groups[id].is_expanded {
                    visible_descendant_slots(groups, id)
                } else {
                    0
                }
            })
            .sum(),
    }
}

/// All descendant group ids of `gid`, preorder.
pub fn descendant_groups(groups: &[RowGroup], gid: usize, out: &mut Vec<usize>) {
    if let GroupChildren::Groups(ids) = &groups[gid].children {
        for &id in ids {
            out.push(id);
            descendant_groups(groups, id, out);
        }
    }
}

/// The sparse slot -> group-header table. One `RowGroupInfo` per bound
/// group; a sorted index of the currently addressable headers supports
/// the header-first slot classification.
#[derive(Debug, Clone, Default)]
pub struct HeaderTable {
    infos: Vec<RowGroupInfo>,
    /// Group ids of addressable headers, ascending by slot.
    visible: Vec<usize>,
}

impl HeaderTable {
    pub fn rebind(&mut self, groups: &[RowGroup]) {
        self.infos = groups
            .iter()
            .enumerate()
            .map(|(id, g)| RowGroupInfo {
                group: id,
                level: g.level,
                slot: 0,
                is_visible: false,
                node: None,
            })
            .collect();
        self.visible.clear();
    }

    pub fn clear(&mut self) {
        self.infos.clear();
        self.visible.clear();
    }

    pub fn info(&self, gid: usize) -> Option<&RowGroupInfo> {
        self.infos.get(gid)
    }

    pub(crate) fn bind_node(&mut self, gid: usize, node: usize) {
        if let Some(info) = self.infos.get_mut(gid) {
            info.node = Some(node);
        }
    }

    /// The header occupying `slot`, if any. Checked before row and tree
    /// lookup when classifying a slot.
    pub fn header_at_slot(&self, slot: usize) -> Option<&RowGroupInfo> {
        let i = self
            .visible
            .partition_point(|&gid| self.infos[gid].slot < slot);
        let gid = *self.visible.get(i)?;
        let info = &self.infos[gid];
        (info.slot == slot).then_some(info)
    }

    pub fn visible_headers(&self) -> impl Iterator<Item = &RowGroupInfo> {
        self.visible.iter().map(|&gid| &self.infos[gid])
    }

    /// Make the header for `gid` addressable at `slot`.
    pub(crate) fn show(&mut self, gid: usize, slot: usize) {
        let Some(info) = self.infos.get_mut(gid) else {
            return;
        };
        info.slot = slot;
        info.is_visible = true;
        let at = self
            .visible
            .partition_point(|&g| self.infos[g].slot < slot);
        if !self.visible.contains(&gid) {
            self.visible.insert(at, gid);
        }
    }

    /// Headers inside the `len` slots starting at `slot` leave the
    /// addressable range; every header past the range shifts left by
    /// `len`. Their infos keep their remembered state.
    pub(crate) fn collapse_range(&mut self, slot: usize, len: usize) {
        let end = slot + len;
        self.visible.retain(|&gid| {
            let header_slot = self.infos[gid].slot;
            !(header_slot >= slot && header_slot < end)
        });
        for info in &mut self.infos {
            if info.is_visible && info.slot >= slot && info.slot < end {
                info.is_visible = false;
            } else if info.is_visible && info.slot >= end {
                info.slot -= len;
            }
        }
    }

    /// Open a `len`-slot gap at `slot`: every addressable header at or
    /// past `slot` shifts right.
    pub(crate) fn open_gap(&mut self, slot: usize, len: usize) {
        for info in &mut self.infos {
            if info.is_visible && info.slot >= slot {
                info.slot += len;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_groups() -> Vec<RowGroup> {
        flatten_group_specs(vec![
            GroupSpec::parent(
                "region",
                vec![
                    GroupSpec::leaf("east", 0..3),
                    GroupSpec::leaf("west", 3..5),
                ],
            ),
            GroupSpec::leaf("other", 5..8),
        ])
    }

    #[test]
    fn flatten_preserves_preorder() {
        let groups = sample_groups();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0].key, "region");
        assert_eq!(groups[1].key, "east");
        assert_eq!(groups[1].parent, Some(0));
        assert_eq!(groups[3].key, "other");
        assert_eq!(root_groups(&groups), vec![0, 3]);
    }

    #[test]
    fn descendant_slot_counts_respect_collapse() {
        let mut groups = sample_groups();
        // region: east header + 3 rows + west header + 2 rows
        assert_eq!(visible_descendant_slots(&groups, 0), 7);
        groups[1].is_expanded = false;
        assert_eq!(visible_descendant_slots(&groups, 0), 4);
    }

    #[test]
    fn header_table_range_operations() {
        let groups = sample_groups();
        let mut table = HeaderTable::default();
        table.rebind(&groups);
        table.show(0, 0);
        table.show(1, 1);
        table.show(2, 5);
        table.show(3, 8);

        assert_eq!(table.header_at_slot(5).unwrap().group, 2);
        assert!(table.header_at_slot(4).is_none());

        // collapse "east": its 3 rows (slots 2..5) leave the range
        table.collapse_range(2, 3);
        assert_eq!(table.info(2).unwrap().slot, 2);
        assert_eq!(table.info(3).unwrap().slot, 5);
        assert!(table.info(1).unwrap().is_visible);

        table.open_gap(2, 3);
        assert_eq!(table.info(2).unwrap().slot, 5);
        assert_eq!(table.info(3).unwrap().slot, 8);
    }
}

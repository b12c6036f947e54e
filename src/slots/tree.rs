use crate::slots::groups::{GroupChildren, RowGroup};

/// Caller-facing description of one hierarchy node.
#[derive(Debug, Clone)]
pub struct TreeSpec {
    pub key: String,
    pub expanded: bool,
    pub children: Vec<TreeSpec>,
}

impl TreeSpec {
    pub fn leaf(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expanded: false,
            children: Vec::new(),
        }
    }

    pub fn branch(key: impl Into<String>, expanded: bool, children: Vec<TreeSpec>) -> Self {
        Self {
            key: key.into(),
            expanded,
            children,
        }
    }
}

/// One node of a bound hierarchy, stored in flat preorder.
///
/// `subtree_len` counts the node itself plus every descendant, so the
/// descendant block of node `i` is exactly `i+1 .. i+subtree_len`. The
/// node's position in the vector is its index in the tree's own flat
/// ordering, distinct from both slot and column index.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub key: String,
    pub level: usize,
    pub subtree_len: usize,
    pub is_expanded: bool,
    /// Flat source row carried by this node, if it represents one.
    pub row: Option<usize>,
    /// Owning group when group headers are addressed as nodes.
    pub group: Option<usize>,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        self.subtree_len > 1
    }
}

/// Flat preorder store for a bound hierarchy. Expansion state lives here;
/// which nodes are currently addressable is the slot space's concern.
#[derive(Debug, Clone, Default)]
pub struct HierarchyStore {
    nodes: Vec<TreeNode>,
    /// `(row, node)` pairs ascending by row, for row -> node resolution.
    row_lookup: Vec<(usize, usize)>,
}

impl HierarchyStore {
    /// Bind a plain tree. Every node carries a source row; rows are the
    /// tree's own flat ordering.
    pub fn from_specs(roots: Vec<TreeSpec>) -> Self {
        fn push(spec: TreeSpec, level: usize, out: &mut Vec<TreeNode>) {
            let id = out.len();
            out.push(TreeNode {
                key: spec.key,
                level,
                subtree_len: 1,
                is_expanded: spec.expanded,
                row: Some(id),
                group: None,
            });
            for child in spec.children {
                push(child, level + 1, out);
            }
            out[id].subtree_len = out.len() - id;
        }

        let mut nodes = Vec::new();
        for root in roots {
            push(root, 0, &mut nodes);
        }
        Self::finish(nodes)
    }

    /// Bind a group forest as a hierarchy: one node per group, one leaf
    /// node per data row. Returns the store and the group -> node map.
    pub fn from_group_forest(
        groups: &[RowGroup],
        roots: &[usize],
        row_key: &dyn Fn(usize) -> String,
    ) -> (Self, Vec<usize>) {
        fn push(
            groups: &[RowGroup],
            gid: usize,
            out: &mut Vec<TreeNode>,
            group_nodes: &mut [usize],
            row_key: &dyn Fn(usize) -> String,
        ) {
            let id = out.len();
            group_nodes[gid] = id;
            let group = &groups[gid];
            out.push(TreeNode {
                key: group.key.clone(),
                level: group.level,
                subtree_len: 1,
                is_expanded: group.is_expanded,
                row: None,
                group: Some(gid),
            });
            match &group.children {
                GroupChildren::Rows(range) => {
                    for row in range.clone() {
                        out.push(TreeNode {
                            key: row_key(row),
                            level: group.level + 1,
                            subtree_len: 1,
                            is_expanded: false,
                            row: Some(row),
                            group: None,
                        });
                    }
                }
                GroupChildren::Groups(ids) => {
                    for &child in ids {
                        push(groups, child, out, group_nodes, row_key);
                    }
                }
            }
            out[id].subtree_len = out.len() - id;
        }

        let mut nodes = Vec::new();
        let mut group_nodes = vec![0usize; groups.len()];
        for &root in roots {
            push(groups, root, &mut nodes, &mut group_nodes, row_key);
        }
        (Self::finish(nodes), group_nodes)
    }

    fn finish(nodes: Vec<TreeNode>) -> Self {
        let row_lookup = nodes
            .iter()
            .enumerate()
            .filter_map(|(id, n)| n.row.map(|row| (row, id)))
            .collect();
        Self { nodes, row_lookup }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.nodes.get(index).is_some_and(|n| n.is_expanded)
    }

    pub(crate) fn set_expanded(&mut self, index: usize, expanded: bool) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.is_expanded = expanded;
        }
    }

    /// Set the target node and its whole subtree to one state. Terminal
    /// once applied: no partial-subtree states remain.
    pub(crate) fn set_subtree_expanded(&mut self, index: usize, expanded: bool) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        let end = index + node.subtree_len;
        for n in &mut self.nodes[index..end] {
            n.is_expanded = expanded;
        }
    }

    /// Root node indices, in order.
    pub fn roots(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.nodes.len() {
            out.push(i);
            i += self.nodes[i].subtree_len;
        }
        out
    }

    /// Immediate children of `index`, in order.
    pub fn children(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let Some(node) = self.nodes.get(index) else {
            return out;
        };
        let end = index + node.subtree_len;
        let mut i = index + 1;
        while i < end {
            out.push(i);
            i += self.nodes[i].subtree_len;
        }
        out
    }

    /// Resolve a flat source row to its node.
    pub fn node_of_row(&self, row: usize) -> Option<usize> {
        let i = self.row_lookup.partition_point(|&(r, _)| r < row);
        match self.row_lookup.get(i) {
            Some(&(r, node)) if r == row => Some(node),
            _ => None,
        }
    }

    /// Number of descendants addressable below `index` when it is
    /// expanded: every child, recursing only into children that are
    /// themselves expanded.
    pub fn visible_descendant_count(&self, index: usize) -> usize {
        self.children(index)
            .into_iter()
            .map(|child| {
                1 + if self.is_expanded(child) {
                    self.visible_descendant_count(child)
                } else {
                    0
                }
            })
            .sum()
    }

    /// Visit the descendants of `index` that become addressable when it
    /// is expanded, in preorder.
    pub fn visit_visible_descendants(&self, index: usize, f: &mut impl FnMut(usize)) {
        for child in self.children(index) {
            f(child);
            if self.is_expanded(child) {
                self.visit_visible_descendants(child, f);
            }
        }
    }

    /// Keys of expanded parent nodes, for layout persistence.
    pub fn expanded_keys(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.has_children() && n.is_expanded)
            .map(|n| n.key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HierarchyStore {
        HierarchyStore::from_specs(vec![
            TreeSpec::branch(
                "a",
                true,
                vec![
                    TreeSpec::branch("a1", false, vec![TreeSpec::leaf("a1x"), TreeSpec::leaf("a1y")]),
                    TreeSpec::leaf("a2"),
                ],
            ),
            TreeSpec::leaf("b"),
        ])
    }

    #[test]
    fn preorder_layout() {
        let tree = sample();
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.node(0).unwrap().subtree_len, 5);
        assert_eq!(tree.roots(), vec![0, 5]);
        assert_eq!(tree.children(0), vec![1, 4]);
        assert_eq!(tree.children(1), vec![2, 3]);
    }

    #[test]
    fn visible_descendants_skip_collapsed_children() {
        let tree = sample();
        // a1 (collapsed) and a2 are visible below a; a1's leaves are not
        assert_eq!(tree.visible_descendant_count(0), 2);

        let mut visited = Vec::new();
        tree.visit_visible_descendants(0, &mut |n| visited.push(n));
        assert_eq!(visited, vec![1, 4]);
    }

    #[test]
    fn subtree_state_is_terminal() {
        let mut tree = sample();
        tree.set_subtree_expanded(0, true);
        assert_eq!(tree.visible_descendant_count(0), 4);
        tree.set_subtree_expanded(0, false);
        assert!(!tree.is_expanded(1));
        assert_eq!(tree.visible_descendant_count(0), 2);
    }

    #[test]
    fn rows_resolve_to_nodes() {
        let tree = sample();
        assert_eq!(tree.node_of_row(3), Some(3));
        assert_eq!(tree.node_of_row(99), None);
    }
}

//! Slot addressing layer
//!
//! One contiguous coordinate ("slot") spans flat data rows, group
//! headers, and hierarchy nodes, so that rendering, selection, and
//! scrolling never care which kind of entry they are pointing at.
//! Collapsed entries leave the coordinate range entirely.

pub mod address_space;
pub mod groups;
mod run_map;
pub mod toggle;
pub mod tree;

pub use address_space::{SlotKind, SlotSpace};
pub use groups::{GroupSpec, GroupSpecKind, RowGroup, RowGroupInfo};
pub use toggle::ToggleResult;
pub use tree::{HierarchyStore, TreeNode, TreeSpec};

//! slotgrid — addressing and reconciliation engine for virtualized
//! table controls.
//!
//! Three ordering spaces stay consistent under continuous mutation while
//! only a visible window of content is materialized:
//!
//! - column creation order vs. column display order ([`columns`]),
//! - frozen-column partitioning derived from display order
//!   ([`columns::frozen`]),
//! - one unified row coordinate ("slot") spanning flat rows, group
//!   headers, and hierarchy nodes ([`slots`]).
//!
//! Rendering, input, selection, and scrolling consume the tables
//! read-only; data binding and layout live elsewhere.

pub mod columns;
pub mod config;
pub mod layout_snapshot;
pub mod logging;
pub mod provider;
pub mod slots;

pub use columns::{ColumnChange, ColumnSet, FrozenPosition, GridColumn};
pub use layout_snapshot::LayoutSnapshot;
pub use provider::RowProvider;
pub use slots::{GroupSpec, SlotKind, SlotSpace, ToggleResult, TreeSpec};

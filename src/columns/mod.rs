//! Column ordering layer
//!
//! This module keeps three things consistent while columns are inserted,
//! removed, and reordered: the physical (creation-order) index of every
//! column, the logical display position it is rendered at, and the frozen
//! partitioning derived from display order.

pub mod column;
pub mod frozen;
pub mod order_table;
pub mod reconciler;

pub use column::{FrozenPosition, GridColumn};
pub use frozen::FrozenLayout;
pub use order_table::{derive_prior_order, DisplayOrderTable, PriorOrder};
pub use reconciler::{ColumnChange, ColumnSet};

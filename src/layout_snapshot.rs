//! Persisted layout snapshot
//!
//! Captures column order, visibility, and widths plus the expanded-node
//! set, keyed independently of transient runtime indices, so a layout
//! survives restarts and data reloads. Restoration goes through the
//! normalize path, so stale or missing keys degrade deterministically
//! instead of erroring.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::columns::{ColumnSet, GridColumn};
use crate::slots::SlotSpace;

/// How snapshot keys relate to columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KeyResolution {
    /// Keys are the column names themselves.
    #[default]
    Identity,
    /// Keys came from a caller-supplied key function; the caller matches
    /// them on restore.
    Custom,
}

/// One persisted column entry, ordered by display position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayoutEntry {
    pub key: String,
    pub display_index: usize,
    pub is_visible: bool,
    pub width: u16,
}

/// The saved layout: column entries in display order plus the expansion
/// set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LayoutSnapshot {
    pub columns: Vec<ColumnLayoutEntry>,
    pub expanded_nodes: Vec<String>,
    pub key_mode: KeyResolution,
}

impl LayoutSnapshot {
    /// Capture the current layout using column names as keys.
    pub fn capture(columns: &ColumnSet, slots: &SlotSpace) -> Self {
        Self::capture_inner(columns, slots, KeyResolution::Identity, |c| {
            c.name().to_string()
        })
    }

    /// Capture with a caller-supplied key function.
    pub fn capture_with_keys(
        columns: &ColumnSet,
        slots: &SlotSpace,
        key_fn: impl Fn(&GridColumn) -> String,
    ) -> Self {
        Self::capture_inner(columns, slots, KeyResolution::Custom, key_fn)
    }

    fn capture_inner(
        columns: &ColumnSet,
        slots: &SlotSpace,
        key_mode: KeyResolution,
        key_fn: impl Fn(&GridColumn) -> String,
    ) -> Self {
        let entries = columns
            .columns_in_display_order()
            .map(|col| ColumnLayoutEntry {
                key: key_fn(col),
                display_index: col.display_index().unwrap_or(col.index()),
                is_visible: col.is_visible(),
                width: col.width(),
            })
            .collect();
        Self {
            columns: entries,
            expanded_nodes: slots.expanded_keys(),
            key_mode,
        }
    }

    /// Restore column order, visibility, and widths. Entries are matched
    /// by key; matched columns get their display index staged and the set
    /// is normalized, so unknown or stale entries cannot corrupt the
    /// order. Returns how many entries matched.
    pub fn apply_columns(&self, columns: &mut ColumnSet) -> usize {
        let mut matched = 0;
        for entry in &self.columns {
            if let Some(index) = columns.index_of(&entry.key) {
                columns.set_width(index, entry.width);
                columns.set_visible(index, entry.is_visible);
                columns.stage_display_index(index, entry.display_index);
                matched += 1;
            }
        }
        columns.normalize();
        debug!(
            target: "layout_snapshot",
            "restored {}/{} column entries",
            matched,
            self.columns.len()
        );
        matched
    }

    /// Replay the persisted expansion set onto a bound slot space.
    pub fn apply_expansion(&self, slots: &mut SlotSpace) {
        slots.apply_expanded_keys(&self.expanded_nodes);
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write layout snapshot to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout snapshot from {}", path.display()))?;
        let snapshot = serde_json::from_str(&json)
            .with_context(|| format!("invalid layout snapshot in {}", path.display()))?;
        Ok(snapshot)
    }
}

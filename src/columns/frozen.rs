use tracing::debug;

use crate::columns::column::FrozenPosition;
use crate::columns::reconciler::ColumnSet;

/// Outcome of a frozen-state recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenLayout {
    /// Columns whose frozen placement changed.
    pub changed: usize,
    /// Total width of left-frozen columns before the recomputation.
    pub left_width_before: usize,
    /// Total width of left-frozen columns after the recomputation.
    pub left_width_after: usize,
    /// Horizontal scroll offset after correction. The offset is reduced by
    /// exactly the left-width delta, floored at zero, so unfrozen content
    /// stays visually stable across frozen-set changes.
    pub corrected_offset: usize,
}

impl ColumnSet {
    /// Derive per-column frozen placement from display order.
    ///
    /// The first `left_count` columns in display order become `Left`; the
    /// columns from `max(left_count, total - right_count)` on become
    /// `Right`, which prevents the two sets from overlapping; everything
    /// in between is unfrozen. Physical order plays no part.
    pub fn recompute_frozen(
        &mut self,
        left_count: usize,
        right_count: usize,
        horizontal_offset: usize,
    ) -> FrozenLayout {
        let total = self.len();
        let right_start = left_count.max(total.saturating_sub(right_count));

        let left_width_before = self.left_frozen_width();

        let order: Vec<usize> = self.display_order().as_slice().to_vec();
        let mut changed = 0;
        for (display, &physical) in order.iter().enumerate() {
            let position = if display < left_count {
                FrozenPosition::Left
            } else if display >= right_start {
                FrozenPosition::Right
            } else {
                FrozenPosition::None
            };
            if let Some(col) = self.column_mut(physical) {
                if col.frozen != position {
                    col.frozen = position;
                    changed += 1;
                }
            }
        }

        let left_width_after = self.left_frozen_width();
        let delta = left_width_after.abs_diff(left_width_before);
        let corrected_offset = horizontal_offset.saturating_sub(delta);

        debug!(
            target: "frozen_columns",
            "recomputed frozen state: left={} right={} changed={} left_width {} -> {} offset {} -> {}",
            left_count, right_count, changed,
            left_width_before, left_width_after,
            horizontal_offset, corrected_offset
        );

        FrozenLayout {
            changed,
            left_width_before,
            left_width_after,
            corrected_offset,
        }
    }

    /// Frozen placements in display order.
    pub fn frozen_positions(&self) -> Vec<FrozenPosition> {
        self.columns_in_display_order()
            .map(|c| c.frozen_position())
            .collect()
    }

    fn left_frozen_width(&self) -> usize {
        self.columns()
            .filter(|c| c.frozen_position() == FrozenPosition::Left)
            .map(|c| c.width() as usize)
            .sum()
    }
}

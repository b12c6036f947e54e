/// One contiguous run of addressable entries: `len` slots starting at
/// `slot`, mapped to source indices starting at `entry`. Both axes are
/// monotonic across a map's runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotRun {
    pub slot: usize,
    pub entry: usize,
    pub len: usize,
}

impl SlotRun {
    fn slot_end(&self) -> usize {
        self.slot + self.len
    }

    fn entry_end(&self) -> usize {
        self.entry + self.len
    }
}

/// Sparse bidirectional mapping between slot coordinates and source
/// indices, stored as ordered runs. Range insertion and removal shift the
/// runs that follow; cost tracks the number of runs, not the number of
/// mapped entries.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlotRunMap {
    runs: Vec<SlotRun>,
}

impl SlotRunMap {
    pub fn clear(&mut self) {
        self.runs.clear();
    }

    #[cfg(test)]
    pub fn mapped_len(&self) -> usize {
        self.runs.iter().map(|r| r.len).sum()
    }

    pub fn entry_at_slot(&self, slot: usize) -> Option<usize> {
        let i = self.runs.partition_point(|r| r.slot <= slot);
        if i == 0 {
            return None;
        }
        let run = self.runs[i - 1];
        if slot < run.slot_end() {
            Some(run.entry + (slot - run.slot))
        } else {
            None
        }
    }

    pub fn slot_of_entry(&self, entry: usize) -> Option<usize> {
        let i = self.runs.partition_point(|r| r.entry <= entry);
        if i == 0 {
            return None;
        }
        let run = self.runs[i - 1];
        if entry < run.entry_end() {
            Some(run.slot + (entry - run.entry))
        } else {
            None
        }
    }

    /// Insert `len` slots at `slot`, mapped to entries starting at
    /// `entry`. A run spanning the insertion point is split; every run at
    /// or after the point shifts right on the slot axis.
    pub fn insert_run(&mut self, slot: usize, entry: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.split_at_slot(slot);
        for run in &mut self.runs {
            if run.slot >= slot {
                run.slot += len;
            }
        }
        let at = self.runs.partition_point(|r| r.slot < slot);
        self.runs.insert(at, SlotRun { slot, entry, len });
        self.coalesce();
    }

    /// Remove the mappings for the `len` slots starting at `slot`; the
    /// runs that follow shift left to keep the coordinate contiguous.
    /// Entries covered by the removed range simply stop being addressable.
    pub fn remove_slot_range(&mut self, slot: usize, len: usize) {
        if len == 0 {
            return;
        }
        let end = slot + len;
        self.split_at_slot(slot);
        self.split_at_slot(end);
        self.runs.retain(|r| !(r.slot >= slot && r.slot_end() <= end));
        for run in &mut self.runs {
            if run.slot >= end {
                run.slot -= len;
            }
        }
        self.coalesce();
    }

    /// Shift the entry axis for every mapping at or above `entry`
    /// (the source gained or lost entries there). A run spanning `entry`
    /// is split first so the shift never tears a run. Slots are
    /// untouched.
    pub fn shift_entries_from(&mut self, entry: usize, delta: isize) {
        self.split_at_entry(entry);
        for run in &mut self.runs {
            if run.entry >= entry {
                run.entry = run.entry.saturating_add_signed(delta);
            }
        }
        self.coalesce();
    }

    /// Slot ranges currently mapped to entries inside
    /// `entry .. entry + count`, in ascending slot order.
    pub fn slots_of_entry_range(&self, entry: usize, count: usize) -> Vec<(usize, usize)> {
        let end = entry + count;
        let mut ranges = Vec::new();
        for run in &self.runs {
            let lo = run.entry.max(entry);
            let hi = run.entry_end().min(end);
            if lo < hi {
                ranges.push((run.slot + (lo - run.entry), hi - lo));
            }
        }
        ranges
    }

    #[cfg(test)]
    pub fn runs(&self) -> &[SlotRun] {
        &self.runs
    }

    /// Split the run spanning `slot` (if any) so that `slot` becomes a
    /// run boundary.
    fn split_at_slot(&mut self, slot: usize) {
        let i = self.runs.partition_point(|r| r.slot < slot);
        if i == 0 {
            return;
        }
        let run = self.runs[i - 1];
        if slot > run.slot && slot < run.slot_end() {
            let head_len = slot - run.slot;
            self.runs[i - 1].len = head_len;
            self.runs.insert(
                i,
                SlotRun {
                    slot,
                    entry: run.entry + head_len,
                    len: run.len - head_len,
                },
            );
        }
    }

    /// Split the run spanning `entry` (if any) so that `entry` becomes a
    /// run boundary on the entry axis.
    fn split_at_entry(&mut self, entry: usize) {
        let i = self.runs.partition_point(|r| r.entry < entry);
        if i == 0 {
            return;
        }
        let run = self.runs[i - 1];
        if entry > run.entry && entry < run.entry_end() {
            let head_len = entry - run.entry;
            self.runs[i - 1].len = head_len;
            self.runs.insert(
                i,
                SlotRun {
                    slot: run.slot + head_len,
                    entry,
                    len: run.len - head_len,
                },
            );
        }
    }

    fn coalesce(&mut self) {
        let mut merged: Vec<SlotRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.slot_end() == run.slot && last.entry_end() == run.entry {
                    last.len += run.len;
                    continue;
                }
            }
            merged.push(run);
        }
        self.runs = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(len: usize) -> SlotRunMap {
        let mut map = SlotRunMap::default();
        map.insert_run(0, 0, len);
        map
    }

    #[test]
    fn identity_lookups() {
        let map = identity(10);
        assert_eq!(map.entry_at_slot(0), Some(0));
        assert_eq!(map.entry_at_slot(9), Some(9));
        assert_eq!(map.entry_at_slot(10), None);
        assert_eq!(map.slot_of_entry(4), Some(4));
    }

    #[test]
    fn remove_splits_and_shifts() {
        let mut map = identity(10);
        map.remove_slot_range(3, 3);
        // slots 0..7 now address entries 0,1,2,6,7,8,9
        assert_eq!(map.mapped_len(), 7);
        assert_eq!(map.entry_at_slot(2), Some(2));
        assert_eq!(map.entry_at_slot(3), Some(6));
        assert_eq!(map.slot_of_entry(6), Some(3));
        assert_eq!(map.slot_of_entry(4), None);
    }

    #[test]
    fn insert_restores_removed_range() {
        let mut map = identity(10);
        map.remove_slot_range(3, 3);
        map.insert_run(3, 3, 3);
        assert_eq!(map.mapped_len(), 10);
        assert_eq!(map.runs().len(), 1);
        for i in 0..10 {
            assert_eq!(map.entry_at_slot(i), Some(i));
        }
    }

    #[test]
    fn insert_between_runs_keeps_both_axes() {
        // a root at entry 0 followed by entries 5,6,7 (entries 1..5 hidden)
        let mut map = SlotRunMap::default();
        map.insert_run(0, 0, 1);
        map.insert_run(1, 5, 3);
        // the hidden entries become addressable again
        map.insert_run(1, 1, 4);
        assert_eq!(map.runs().len(), 1);
        assert_eq!(map.mapped_len(), 8);
        assert_eq!(map.entry_at_slot(1), Some(1));
        assert_eq!(map.entry_at_slot(5), Some(5));
        assert_eq!(map.slot_of_entry(7), Some(7));
    }

    #[test]
    fn entry_shifts() {
        let mut map = identity(5);
        map.remove_slot_range(1, 2);
        map.shift_entries_from(3, 2);
        assert_eq!(map.entry_at_slot(1), Some(5));
        assert_eq!(map.entry_at_slot(0), Some(0));
    }

    #[test]
    fn slots_of_entry_range_spans_fragments() {
        let mut map = identity(10);
        map.remove_slot_range(2, 2); // entries 2,3 unaddressable
        let ranges = map.slots_of_entry_range(1, 5);
        // entry 1 at slot 1; entries 4,5 at slots 2,3
        assert_eq!(ranges, vec![(1, 1), (2, 2)]);
    }
}

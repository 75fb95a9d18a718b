//! The slicing → parsing → merging pipeline.

pub mod merger;
pub mod parser;

use std::collections::HashMap;

use crate::types::{DayId, DayKey, PathId};

/// A worker-local summary of one byte-range slice: path discovery order, a
/// local day table, and a sparse per-path×day count matrix.
///
/// Also reused, with global ids, as the merged [`GlobalAggregate`] — the two
/// share a shape; only the meaning of the ids differs.
#[derive(Debug, Default, Clone)]
pub struct Aggregate {
    /// PathIds in first-seen order within this aggregate. No duplicates.
    pub order: Vec<PathId>,
    /// DayKeys in first-seen order; index is the (local or global) DayId.
    pub days: Vec<DayKey>,
    /// Per-path sparse row: DayId -> count.
    pub matrix: HashMap<PathId, HashMap<DayId, u64>>,
    seen: HashMap<PathId, ()>,
    day_ids: HashMap<DayKey, DayId>,
}

/// Alias used where the spec's "PartialAggregate" and "GlobalAggregate" are
/// the same Rust type — the distinction is purely about which stage produced
/// it (see SPEC_FULL.md §3).
pub type PartialAggregate = Aggregate;
pub type GlobalAggregate = Aggregate;

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `(pid, day)`, assigning fresh local ids to
    /// either as needed. This is the single mutation point both the slice
    /// parser and the merger go through.
    pub fn record(&mut self, pid: PathId, day: DayKey) {
        if self.seen.insert(pid, ()).is_none() {
            self.order.push(pid);
        }
        let did = *self.day_ids.entry(day).or_insert_with(|| {
            let id = self.days.len() as DayId;
            self.days.push(day);
            id
        });
        *self.matrix.entry(pid).or_default().entry(did).or_insert(0) += 1;
    }

    /// Add `count` to `(pid, did)` where `did` is already a valid id in
    /// `self.days` (used by the merger, which resolves day ids itself via
    /// [`Self::global_day_id`] before calling this).
    pub fn add_count(&mut self, pid: PathId, did: DayId, count: u64) {
        if self.seen.insert(pid, ()).is_none() {
            self.order.push(pid);
        }
        *self.matrix.entry(pid).or_default().entry(did).or_insert(0) += count;
    }

    /// Resolve (assigning if necessary) the id for `day` within this
    /// aggregate's day table, for use by the merger's remap step.
    pub fn global_day_id(&mut self, day: DayKey) -> DayId {
        *self.day_ids.entry(day).or_insert_with(|| {
            let id = self.days.len() as DayId;
            self.days.push(day);
            id
        })
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty() && self.days.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_tracks_first_seen_order_and_counts() {
        let mut agg = Aggregate::new();
        let d1 = DayKey::from_bytes(b"2026-01-24");
        let d2 = DayKey::from_bytes(b"2026-01-25");

        agg.record(5, d1);
        agg.record(3, d1);
        agg.record(5, d2);
        agg.record(5, d1);

        assert_eq!(agg.order, vec![5, 3]);
        assert_eq!(agg.days, vec![d1, d2]);
        assert_eq!(agg.matrix[&5][&0], 2);
        assert_eq!(agg.matrix[&5][&1], 1);
        assert_eq!(agg.matrix[&3][&0], 1);
    }
}

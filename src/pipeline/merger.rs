//! Folds an ordered sequence of partial aggregates into one global aggregate.
//!
//! The merge order is the contract that makes output deterministic: callers
//! (the worker pool) must hand aggregates to [`merge`] in
//! `[worker0, worker1, ..., workerW-2, controller]` order — see
//! SPEC_FULL.md §4.4.

use super::{GlobalAggregate, PartialAggregate};

/// Fold `partials`, in order, into a single [`GlobalAggregate`].
///
/// Path identity is first-seen across the whole sequence; day identity is
/// likewise first-seen, remapped from each partial's local day table into
/// the shared global one.
pub fn merge(partials: impl IntoIterator<Item = PartialAggregate>) -> GlobalAggregate {
    let mut global = GlobalAggregate::new();

    for partial in partials {
        let remap: Vec<u32> = partial
            .days
            .iter()
            .map(|&day| global.global_day_id(day))
            .collect();

        // Drive introduction order from `partial.order` itself, not from
        // iterating `partial.matrix` (a HashMap, whose iteration order is
        // unrelated to insertion order).
        for &pid in &partial.order {
            let Some(row) = partial.matrix.get(&pid) else {
                continue;
            };
            for (&local_did, &count) in row {
                let global_did = remap[local_did as usize];
                global.add_count(pid, global_did, count);
            }
        }
    }

    global
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::types::DayKey;

    fn day(s: &str) -> DayKey {
        DayKey::from_bytes(s.as_bytes())
    }

    #[test]
    fn preserves_first_seen_path_order_across_partials() {
        let mut a = PartialAggregate::new();
        a.record(7, day("2026-01-25")); // path 7 seen first, in slice A
        a.record(3, day("2026-01-24"));

        let mut b = PartialAggregate::new();
        b.record(3, day("2026-01-24")); // path 3 already seen in A
        b.record(9, day("2026-01-25"));

        let merged = merge([a, b]);
        assert_eq!(merged.order, vec![7, 3, 9]);
    }

    #[test]
    fn remaps_local_day_ids_to_a_shared_table() {
        let mut a = PartialAggregate::new();
        a.record(1, day("2026-01-25")); // local day 0 = Jan 25 in A

        let mut b = PartialAggregate::new();
        b.record(1, day("2026-01-24")); // local day 0 = Jan 24 in B
        b.record(1, day("2026-01-25")); // local day 1 = Jan 25 in B

        let merged = merge([a, b]);
        assert_eq!(merged.days.len(), 2);

        let row = &merged.matrix[&1];
        let jan24_id = merged.days.iter().position(|&d| d == day("2026-01-24")).unwrap() as u32;
        let jan25_id = merged.days.iter().position(|&d| d == day("2026-01-25")).unwrap() as u32;
        assert_eq!(row[&jan24_id], 1);
        assert_eq!(row[&jan25_id], 2);
    }

    #[test]
    fn sums_counts_for_the_same_path_and_day_across_partials() {
        let mut a = PartialAggregate::new();
        for _ in 0..100 {
            a.record(0, day("2026-01-24"));
        }
        let mut b = PartialAggregate::new();
        for _ in 0..100 {
            b.record(0, day("2026-01-24"));
        }

        let merged = merge([a, b]);
        let did = merged.days.iter().position(|&d| d == day("2026-01-24")).unwrap() as u32;
        assert_eq!(merged.matrix[&0][&did], 200);
    }

    #[test]
    fn merging_nothing_yields_empty_aggregate() {
        let merged = merge(Vec::<PartialAggregate>::new());
        assert!(merged.is_empty());
    }
}

//! WorkerPool: fans a file's cut ranges out across a bounded rayon thread
//! pool and joins the results back in a fixed, deterministic order.
//!
//! Mirrors the teacher's `bench::run_benchmark_parallel_with` — configure a
//! `rayon::ThreadPoolBuilder` with an explicit thread count, then drive the
//! work through `par_iter().collect()`, which preserves input order in the
//! returned `Vec` regardless of which slice finishes first.

use std::path::Path;

use rayon::prelude::*;

use crate::catalog::PathCatalog;
use crate::error::ParserError;
use crate::pipeline::parser::{self, ReadHints};
use crate::pipeline::PartialAggregate;

/// Below this input size the small-file fallback runs a single SliceParser
/// on the controlling thread instead of fanning out across a pool.
pub const PARALLEL_MIN_BYTES: u64 = 128 * 1024 * 1024;

/// Run one SliceParser per `[cuts[i], cuts[i+1])` range across a bounded
/// thread pool and return the resulting aggregates in `cuts` order.
///
/// `cuts` order is also the merge order: `SliceMerger` must receive these
/// aggregates in the same sequence it gets them back in here for output to
/// be deterministic (SPEC_FULL.md §4.4/§4.5).
pub fn run(
    path: &Path,
    cuts: &[u64],
    workers: usize,
    catalog: &PathCatalog,
    hints: ReadHints,
) -> Result<Vec<PartialAggregate>, ParserError> {
    let ranges: Vec<std::ops::Range<u64>> = cuts.windows(2).map(|w| w[0]..w[1]).collect();

    if ranges.len() <= 1 {
        return Ok(ranges
            .into_iter()
            .map(|r| parser::parse_slice(path, r, catalog, hints))
            .collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| ParserError::WorkerSpawnFailed {
            index: 0,
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;

    let aggregates = pool.install(|| {
        ranges
            .par_iter()
            .map(|range| parser::parse_slice(path, range.clone(), catalog, hints))
            .collect::<Vec<_>>()
    });

    Ok(aggregates)
}

/// Decide the worker count to actually use for `file_size`, given the
/// configured `workers` and whether `PARSER_FORCE_MULTICORE` is set.
///
/// Mirrors §4.5's fallback rule: small inputs run single-threaded unless the
/// caller forces multicore.
pub fn effective_workers(workers: usize, file_size: u64, force_multicore: bool) -> usize {
    if workers <= 1 {
        return 1;
    }
    if !force_multicore && file_size < PARALLEL_MIN_BYTES {
        return 1;
    }
    workers
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::offsets;
    use std::io::Write;

    fn catalog_with(paths: &[&str]) -> PathCatalog {
        PathCatalog::build(
            paths
                .iter()
                .enumerate()
                .map(|(i, p)| (i as u32, format!("https://stitcher.io{}", p))),
        )
    }

    fn hints() -> ReadHints {
        ReadHints {
            read_chunk: 64 * 1024,
            read_buffer_hint: 0,
        }
    }

    #[test]
    fn effective_workers_falls_back_to_one_below_threshold() {
        assert_eq!(effective_workers(8, 1024, false), 1);
        assert_eq!(effective_workers(8, 1024, true), 8);
        assert_eq!(effective_workers(8, PARALLEL_MIN_BYTES + 1, false), 8);
        assert_eq!(effective_workers(1, PARALLEL_MIN_BYTES + 1, true), 1);
    }

    #[test]
    fn run_preserves_cut_order_and_total_counts() {
        let cat = catalog_with(&["/a"]);
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for i in 0..4000 {
            let day = if i % 2 == 0 { "2026-01-24" } else { "2026-01-25" };
            writeln!(f, "https://stitcher.io/a,{}T00:00:00+00:00", day).unwrap();
        }
        f.flush().unwrap();
        let size = f.as_file().metadata().unwrap().len();

        let mut opened = f.reopen().unwrap();
        let cuts = offsets::compute_cuts(&mut opened, size, 4).unwrap();

        let aggregates = run(f.path(), &cuts, 4, &cat, hints()).unwrap();
        assert_eq!(aggregates.len(), cuts.len() - 1);

        let total: u64 = aggregates
            .iter()
            .flat_map(|a| a.matrix.values())
            .flat_map(|row| row.values())
            .sum();
        assert_eq!(total, 4000);
    }

    #[test]
    fn single_cut_range_skips_the_pool() {
        let cat = catalog_with(&["/a"]);
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "https://stitcher.io/a,2026-01-24T00:00:00+00:00").unwrap();
        f.flush().unwrap();
        let size = f.as_file().metadata().unwrap().len();

        let aggregates = run(f.path(), &[0, size], 8, &cat, hints()).unwrap();
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].matrix[&0].values().sum::<u64>(), 1);
    }
}

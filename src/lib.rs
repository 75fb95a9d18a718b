//! Parses a fixed-shape append-only visit log into a per-path, per-day
//! count histogram and writes it out as JSON.
//!
//! The library surface is a single entry point, [`parse`]; everything else
//! (CLI, logging setup) lives in the binary crate.

pub mod catalog;
pub mod config;
pub mod emitter;
pub mod error;
pub mod offsets;
pub mod pipeline;
pub mod types;
pub mod workers;

use std::path::Path;
use std::time::Instant;

use catalog::PathCatalog;
use config::ParserOptions;
use error::ParserError;
use pipeline::parser::ReadHints;

/// Per-stage timings, populated when the caller asks for them (the CLI's
/// `--stats` flag). Not part of the core contract otherwise.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub slice_count: usize,
    pub slice_ranges: Vec<(u64, u64)>,
    pub parse_seconds: f64,
    pub merge_seconds: f64,
    pub emit_seconds: f64,
}

/// Parse `input_path` against `catalog` and write the resulting histogram to
/// `output_path`, per SPEC_FULL.md §4 end-to-end.
///
/// Returns timing stats for the run; the caller decides whether to print
/// them.
pub fn parse(
    input_path: &Path,
    output_path: &Path,
    catalog: &PathCatalog,
    options: &ParserOptions,
) -> Result<RunStats, ParserError> {
    let mut stats = RunStats::default();

    let size = std::fs::metadata(input_path).map(|m| m.len()).unwrap_or(0);

    let cuts = match std::fs::File::open(input_path) {
        Ok(mut file) => {
            let w = workers::effective_workers(options.workers, size, options.force_multicore);
            offsets::compute_cuts(&mut file, size, w).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to align slice cuts, falling back to a single slice");
                offsets::single_slice(size)
            })
        }
        Err(e) => {
            tracing::warn!(path = %input_path.display(), error = %e, "input file unavailable, treating size as 0");
            offsets::single_slice(0)
        }
    };

    stats.slice_count = cuts.len().saturating_sub(1);
    stats.slice_ranges = cuts.windows(2).map(|w| (w[0], w[1])).collect();

    let hints = ReadHints {
        read_chunk: options.read_chunk_size,
        read_buffer_hint: options.read_buffer_hint,
    };

    let effective_workers =
        workers::effective_workers(options.workers, size, options.force_multicore);

    let parse_start = Instant::now();
    let partials = workers::run(input_path, &cuts, effective_workers, catalog, hints)?;
    stats.parse_seconds = parse_start.elapsed().as_secs_f64();

    let merge_start = Instant::now();
    let merged = pipeline::merger::merge(partials);
    stats.merge_seconds = merge_start.elapsed().as_secs_f64();

    let emit_start = Instant::now();
    emitter::emit(
        output_path,
        &merged,
        catalog,
        options.output_strategy,
        options.write_buffer_size,
    )?;
    stats.emit_seconds = emit_start.elapsed().as_secs_f64();

    Ok(stats)
}

//! Parser configuration.
//!
//! Reads the environment options from SPEC_FULL.md §6, with defaults and
//! clamping rules applied the same way `ShipperConfig::from_env` layers file
//! and env-var sources for the teacher's shipping engine.

use anyhow::Result;

use crate::emitter::OutputStrategy;

const DEFAULT_WORKERS: usize = 8;
const MAX_WORKERS: usize = 16;
const MIN_CHUNK_BYTES: usize = 64 * 1024;
const MAX_CHUNK_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub workers: usize,
    pub force_multicore: bool,
    pub read_chunk_size: usize,
    pub write_buffer_size: usize,
    pub read_buffer_hint: usize,
    pub output_strategy: OutputStrategy,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            force_multicore: false,
            read_chunk_size: MIN_CHUNK_BYTES,
            write_buffer_size: MIN_CHUNK_BYTES,
            read_buffer_hint: 0,
            output_strategy: OutputStrategy::Hybrid,
        }
    }
}

impl ParserOptions {
    /// Load config from the environment (see SPEC_FULL.md §6 for the exact
    /// variable names and clamping rules).
    pub fn from_env() -> Result<Self> {
        let mut opts = Self::default();

        if let Ok(raw) = std::env::var("PARSER_WORKERS") {
            if let Ok(n) = raw.trim().parse::<i64>() {
                opts.workers = if n <= 0 {
                    DEFAULT_WORKERS
                } else {
                    (n as usize).min(MAX_WORKERS)
                };
            }
        }

        if let Ok(raw) = std::env::var("PARSER_FORCE_MULTICORE") {
            opts.force_multicore = raw.trim() == "1";
        }

        if let Ok(raw) = std::env::var("PARSER_READ_CHUNK_SIZE") {
            if let Some(n) = parse_byte_size(&raw) {
                opts.read_chunk_size = clamp_chunk(n);
            }
        }

        if let Ok(raw) = std::env::var("PARSER_WRITE_BUFFER_SIZE") {
            if let Some(n) = parse_byte_size(&raw) {
                opts.write_buffer_size = clamp_chunk(n);
            }
        }

        if let Ok(raw) = std::env::var("PARSER_READ_BUFFER") {
            if let Some(n) = parse_byte_size(&raw) {
                opts.read_buffer_hint = if n == 0 { 0 } else { clamp_chunk(n) };
            }
        }

        if let Ok(raw) = std::env::var("PARSER_OUTPUT_STRATEGY") {
            let trimmed = raw.trim();
            opts.output_strategy = match trimmed {
                "" => opts.output_strategy,
                "sort" => OutputStrategy::Sort,
                "scan" => OutputStrategy::Scan,
                "hybrid" => OutputStrategy::Hybrid,
                other => {
                    tracing::warn!(value = %other, "unrecognized PARSER_OUTPUT_STRATEGY, falling back to scan");
                    OutputStrategy::Scan
                }
            };
        }

        Ok(opts)
    }

    /// Apply explicit CLI overrides on top of the loaded environment config.
    pub fn with_overrides(mut self, workers: Option<usize>, force_multicore: bool) -> Self {
        if let Some(w) = workers {
            if w > 0 {
                self.workers = w.min(MAX_WORKERS);
            }
        }
        if force_multicore {
            self.force_multicore = true;
        }
        self
    }
}

/// Strip underscores/commas (thousands separators some operators type) before
/// parsing a byte-size env var.
fn parse_byte_size(raw: &str) -> Option<usize> {
    let cleaned: String = raw.chars().filter(|c| *c != '_' && *c != ',').collect();
    cleaned.trim().parse::<usize>().ok()
}

fn clamp_chunk(n: usize) -> usize {
    n.clamp(MIN_CHUNK_BYTES, MAX_CHUNK_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_byte_size_strips_separators() {
        assert_eq!(parse_byte_size("1_048_576"), Some(1_048_576));
        assert_eq!(parse_byte_size("1,048,576"), Some(1_048_576));
        assert_eq!(parse_byte_size("not-a-number"), None);
    }

    #[test]
    fn clamp_chunk_respects_bounds() {
        assert_eq!(clamp_chunk(1), MIN_CHUNK_BYTES);
        assert_eq!(clamp_chunk(MAX_CHUNK_BYTES * 2), MAX_CHUNK_BYTES);
        assert_eq!(clamp_chunk(MIN_CHUNK_BYTES + 1), MIN_CHUNK_BYTES + 1);
    }

    #[test]
    fn with_overrides_ignores_zero_workers() {
        let opts = ParserOptions::default().with_overrides(Some(0), false);
        assert_eq!(opts.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn with_overrides_clamps_to_max_workers() {
        let opts = ParserOptions::default().with_overrides(Some(64), false);
        assert_eq!(opts.workers, MAX_WORKERS);
    }
}

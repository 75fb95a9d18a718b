//! The core pipeline's own error type.
//!
//! Only the conditions SPEC_FULL.md §7 marks as "surfaced" get a variant
//! here; everything else (mid-stream read errors, a panicking worker, an
//! unopenable input) is absorbed inside the pipeline and never reaches a
//! caller as a `Result::Err`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("failed to spawn worker thread {index}: {source}")]
    WorkerSpawnFailed {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("could not open output file {path}: {source}")]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

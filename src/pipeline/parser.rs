//! The hot loop: parses a byte range of fixed-shape visit records into a
//! [`super::PartialAggregate`].
//!
//! Mirrors the dual mmap/buffered-read strategy of a session-file parser:
//! large ranges are mapped once and scanned in place; small ranges go through
//! a bounded read loop with an explicit carry buffer. Both paths exploit the
//! record's fixed tail length (§3) instead of a general line tokenizer.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;

use memmap2::Mmap;

use crate::catalog::{PathCatalog, PATH_PREFIX_LEN, RECORD_TAIL_LEN, TIMESTAMP_LEN};
use crate::types::DayKey;

use super::PartialAggregate;

/// Ranges at or above this size are parsed via mmap; smaller ranges use a
/// bounded buffered read loop. Mirrors the teacher's `MMAP_THRESHOLD`.
const MMAP_THRESHOLD: u64 = 1_048_576;

/// Advisory OS read hints, applied (where supported) before the range is
/// read. `read_buffer_hint == 0` means "leave the OS default."
#[derive(Copy, Clone, Debug)]
pub struct ReadHints {
    pub read_chunk: usize,
    pub read_buffer_hint: usize,
}

/// Parse the fixed-shape records in `range` of `path`, producing a partial
/// aggregate of everything this slice saw.
///
/// I/O errors on open yield an empty aggregate; a read error mid-stream
/// returns whatever was accumulated so far (SPEC_FULL.md §4.3, "Failure").
pub fn parse_slice(
    path: &std::path::Path,
    range: Range<u64>,
    catalog: &PathCatalog,
    hints: ReadHints,
) -> PartialAggregate {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "slice parser: failed to open input");
            return PartialAggregate::new();
        }
    };

    apply_read_buffer_hint(&file, hints.read_buffer_hint);

    let len = range.end.saturating_sub(range.start);
    if len == 0 {
        return PartialAggregate::new();
    }

    // Whether `range` reaches the true end of the whole file, not just the
    // end of this slice — the only case where a trailing, unterminated line
    // belongs to this slice rather than continuing into the next one.
    let file_size = file.metadata().map(|m| m.len()).unwrap_or(range.end);
    let is_final_slice = range.end >= file_size;

    if len >= MMAP_THRESHOLD {
        match parse_mmap(&file, range.clone(), catalog) {
            Ok(agg) => agg,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "slice parser: mmap failed, falling back to buffered read");
                parse_buffered(file, range, catalog, hints.read_chunk, is_final_slice)
            }
        }
    } else {
        parse_buffered(file, range, catalog, hints.read_chunk, is_final_slice)
    }
}

#[cfg(unix)]
fn apply_read_buffer_hint(file: &File, hint: usize) {
    use std::os::unix::io::AsRawFd;

    if hint == 0 {
        return;
    }
    // Advisory only — a failed fadvise never affects correctness.
    unsafe {
        libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_SEQUENTIAL);
    }
}

#[cfg(not(unix))]
fn apply_read_buffer_hint(_file: &File, _hint: usize) {}

// ---------------------------------------------------------------------------
// mmap-based parsing (large ranges)
// ---------------------------------------------------------------------------

fn parse_mmap(
    file: &File,
    range: Range<u64>,
    catalog: &PathCatalog,
) -> std::io::Result<PartialAggregate> {
    let mmap = unsafe { Mmap::map(file)? };
    let mut agg = PartialAggregate::new();

    let start = range.start as usize;
    let end = (range.end as usize).min(mmap.len());
    if start >= end {
        return Ok(agg);
    }
    let data = &mmap[start..end];

    let mut pos = 0usize;
    let mut last_complete = 0usize;
    while pos < data.len() {
        match memchr::memchr(b'\n', &data[pos..]) {
            Some(nl) => {
                let line = &data[pos..pos + nl];
                handle_line(line, catalog, &mut agg);
                pos += nl + 1;
                last_complete = pos;
            }
            None => break,
        }
    }

    // A non-empty tail here is the unterminated last line of the *whole
    // file* (the range ends at EOF) — the splitter guarantees every other
    // cut lands right after a newline, so any range that isn't the final
    // one always has `last_complete == data.len()`. See SPEC_FULL.md §9.
    let reached_input_eof = range.end as usize >= mmap.len();
    if last_complete < data.len() && reached_input_eof {
        handle_line(&data[last_complete..], catalog, &mut agg);
    }

    Ok(agg)
}

// ---------------------------------------------------------------------------
// Buffered read loop (small ranges)
// ---------------------------------------------------------------------------

fn parse_buffered(
    mut file: File,
    range: Range<u64>,
    catalog: &PathCatalog,
    read_chunk: usize,
    is_final_slice: bool,
) -> PartialAggregate {
    let mut agg = PartialAggregate::new();

    if file.seek(SeekFrom::Start(range.start)).is_err() {
        return agg;
    }

    let total = range.end.saturating_sub(range.start);
    let mut remaining = total;
    let mut carry: Vec<u8> = Vec::new();
    let chunk_size = read_chunk.max(1);
    let mut buf = vec![0u8; chunk_size];

    while remaining > 0 {
        let want = chunk_size.min(remaining as usize);
        let n = match file.read(&mut buf[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "slice parser: mid-stream read error, returning partial aggregate");
                break;
            }
        };
        remaining -= n as u64;

        carry.extend_from_slice(&buf[..n]);

        match memchr::memrchr(b'\n', &carry) {
            Some(last_nl) => {
                {
                    let mut start = 0usize;
                    for nl in memchr::memchr_iter(b'\n', &carry[..last_nl + 1]) {
                        handle_line(&carry[start..nl], catalog, &mut agg);
                        start = nl + 1;
                    }
                }
                carry.drain(..=last_nl);
            }
            None => {
                // No newline yet in the whole accumulated buffer — keep
                // reading (or, if a caller wants a memory bound, this is
                // where a pathologically long line would be truncated).
            }
        }
    }

    if !carry.is_empty() && is_final_slice {
        handle_line(&carry, catalog, &mut agg);
    }

    agg
}

// ---------------------------------------------------------------------------
// Per-line fast path (SPEC_FULL.md §4.3.1)
// ---------------------------------------------------------------------------

fn handle_line(line: &[u8], catalog: &PathCatalog, agg: &mut PartialAggregate) {
    let len = line.len();
    if len < RECORD_TAIL_LEN {
        return;
    }
    let path_len = len - RECORD_TAIL_LEN;
    if path_len == 0 {
        return;
    }

    let path = &line[PATH_PREFIX_LEN..PATH_PREFIX_LEN + path_len];
    let Some(pid) = catalog.lookup(path) else {
        return;
    };

    let day_start = len - TIMESTAMP_LEN;
    let day = DayKey::from_bytes(&line[day_start..day_start + crate::types::DAY_LEN]);

    agg.record(pid, day);
}

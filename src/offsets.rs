//! Byte-range splitting aligned to record (line) boundaries.
//!
//! Cuts a file into `W` non-overlapping ranges so that every complete record
//! falls entirely within exactly one range — the property the slice parser's
//! carry-handling contract depends on.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

/// Read chunk used while scanning forward for the next newline.
const SCAN_CHUNK: usize = 64 * 1024;

/// Compute `workers + 1` cut points `[0, ..., size]` over a file already open
/// for reading, such that `cuts[i]` is the start of a record for every `i`.
///
/// `workers` is clamped to at least 1. If `workers <= 1`, returns `[0, size]`
/// without touching the file.
pub fn compute_cuts(file: &mut File, size: u64, workers: usize) -> std::io::Result<Vec<u64>> {
    let w = workers.max(1) as u64;
    if w <= 1 {
        return Ok(vec![0, size]);
    }

    let mut cuts = Vec::with_capacity(w as usize + 1);
    cuts.push(0);

    for i in 1..w {
        let target = (size / w) * i;
        let cut = find_next_record_start(file, target, size)?.unwrap_or(size);
        cuts.push(cut);
    }

    cuts.push(size);
    Ok(cuts)
}

/// Fall back to the single-slice case when the input file cannot be opened
/// or sized at all (see SPEC_FULL.md §4.2, "if the file cannot be opened").
pub fn single_slice(size: u64) -> Vec<u64> {
    vec![0, size]
}

/// Seek to `start` and scan forward for the next `\n`, returning the offset
/// of the byte following it (the start of the next record). Returns `None`
/// if no newline is found before `size` is reached — the caller then treats
/// the cut as `size`, which yields an empty trailing slice.
fn find_next_record_start(file: &mut File, start: u64, size: u64) -> std::io::Result<Option<u64>> {
    if start >= size {
        return Ok(None);
    }
    file.seek(SeekFrom::Start(start))?;

    let mut buf = vec![0u8; SCAN_CHUNK];
    let mut pos = start;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        if let Some(idx) = memchr::memchr(b'\n', &buf[..n]) {
            return Ok(Some(pos + idx as u64 + 1));
        }
        pos += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_temp(lines: &[&str]) -> (tempfile::NamedTempFile, u64) {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        f.flush().unwrap();
        let size = f.as_file().metadata().unwrap().len();
        (f, size)
    }

    #[test]
    fn single_worker_yields_full_range() {
        let (tmp, size) = write_temp(&["a", "bb", "ccc"]);
        let mut file = tmp.reopen().unwrap();
        let cuts = compute_cuts(&mut file, size, 1).unwrap();
        assert_eq!(cuts, vec![0, size]);
    }

    #[test]
    fn cuts_cover_file_exactly_once() {
        let lines: Vec<String> = (0..1000).map(|i| format!("line-{:04}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
        let (tmp, size) = write_temp(&refs);

        for workers in [1usize, 2, 3, 4, 7, 16] {
            let mut file = tmp.reopen().unwrap();
            let cuts = compute_cuts(&mut file, size, workers).unwrap();
            assert_eq!(cuts[0], 0);
            assert_eq!(*cuts.last().unwrap(), size);
            for w in cuts.windows(2) {
                assert!(w[0] <= w[1]);
            }

            // Every cut (besides 0 and size) must land right after a newline,
            // i.e. at the start of a line or at EOF.
            let data = std::fs::read(tmp.path()).unwrap();
            for &c in &cuts[1..cuts.len() - 1] {
                if c == size {
                    continue;
                }
                assert!(c == 0 || data[(c - 1) as usize] == b'\n');
            }
        }
    }

    #[test]
    fn no_newline_in_remaining_bytes_cuts_to_size() {
        // A single line with no trailing newline: any interior target cut
        // should collapse to `size` since no newline exists past `start`.
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "no-newline-at-all-in-this-line").unwrap();
        tmp.flush().unwrap();
        let size = tmp.as_file().metadata().unwrap().len();

        let mut file = tmp.reopen().unwrap();
        let cuts = compute_cuts(&mut file, size, 4).unwrap();
        assert_eq!(cuts[0], 0);
        assert_eq!(*cuts.last().unwrap(), size);
        // All interior cuts collapse to `size` since there's no newline.
        for &c in &cuts[1..cuts.len() - 1] {
            assert_eq!(c, size);
        }
    }
}

//! JsonEmitter: writes the merged aggregate as the fixed-grammar JSON object
//! described in SPEC_FULL.md §4.6.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::ParserError;
use crate::pipeline::GlobalAggregate;

/// Day-ordering strategy within a path's row. See §4.6 for the cutoff.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputStrategy {
    Sort,
    Scan,
    Hybrid,
}

/// Write `aggregate` as JSON to `output_path`, using `catalog` to resolve
/// escaped path strings and `strategy` to choose each row's day order.
///
/// `write_buffer_hint` sizes the `BufWriter`; `0` falls back to the default.
pub fn emit(
    output_path: &Path,
    aggregate: &GlobalAggregate,
    catalog: &crate::catalog::PathCatalog,
    strategy: OutputStrategy,
    write_buffer_hint: usize,
) -> Result<(), ParserError> {
    let file = std::fs::File::create(output_path).map_err(|e| ParserError::OutputUnavailable {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    let mut writer = if write_buffer_hint == 0 {
        BufWriter::new(file)
    } else {
        BufWriter::with_capacity(write_buffer_hint, file)
    };

    write_json(&mut writer, aggregate, catalog, strategy).map_err(|e| {
        ParserError::OutputUnavailable {
            path: output_path.to_path_buf(),
            source: e,
        }
    })?;

    writer.flush().map_err(|e| ParserError::OutputUnavailable {
        path: output_path.to_path_buf(),
        source: e,
    })
}

fn write_json<W: Write>(
    w: &mut W,
    aggregate: &GlobalAggregate,
    catalog: &crate::catalog::PathCatalog,
    strategy: OutputStrategy,
) -> io::Result<()> {
    if catalog.is_empty() {
        return w.write_all(b"{}");
    }

    // Sorted once, up front: this is both the `scan` iteration order and the
    // ascending order `sort` must also produce.
    let mut sorted_days: Vec<(usize, crate::types::DayKey)> =
        aggregate.days.iter().copied().enumerate().collect();
    sorted_days.sort_by_key(|&(_, day)| day);

    w.write_all(b"{")?;

    let total_days = aggregate.days.len();
    let mut first_path = true;
    for &pid in &aggregate.order {
        let Some(escaped) = catalog.escaped_path(pid) else {
            continue;
        };
        let Some(row) = aggregate.matrix.get(&pid) else {
            continue;
        };
        if row.is_empty() {
            continue;
        }

        w.write_all(if first_path { b"\n    \"" } else { b",\n    \"" })?;
        first_path = false;
        w.write_all(escaped.as_bytes())?;
        w.write_all(b"\": {")?;

        let use_sort = match strategy {
            OutputStrategy::Sort => true,
            OutputStrategy::Scan => false,
            OutputStrategy::Hybrid => 2 * row.len() < total_days,
        };

        let mut first_day = true;
        if use_sort {
            let mut entries: Vec<(crate::types::DayKey, u64)> = row
                .iter()
                .map(|(&did, &count)| (aggregate.days[did as usize], count))
                .collect();
            entries.sort_by_key(|&(day, _)| day);
            for (day, count) in entries {
                write_day_entry(w, &mut first_day, day.as_str(), count)?;
            }
        } else {
            for &(local_did, day) in &sorted_days {
                if let Some(&count) = row.get(&(local_did as u32)) {
                    write_day_entry(w, &mut first_day, day.as_str(), count)?;
                }
            }
        }

        if !first_day {
            w.write_all(b"\n    ")?;
        }
        w.write_all(b"}")?;
    }

    w.write_all(b"\n}")
}

fn write_day_entry<W: Write>(
    w: &mut W,
    first: &mut bool,
    day: &str,
    count: u64,
) -> io::Result<()> {
    w.write_all(if *first { b"\n        \"" } else { b",\n        \"" })?;
    *first = false;
    w.write_all(day.as_bytes())?;
    write!(w, "\": {}", count)
}

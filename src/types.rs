//! Shared value types for the visit-log pipeline.
//!
//! Small `Copy` identifiers passed between the catalog, the slice parser,
//! the merger, and the emitter.

/// Stable numeric id assigned by [`crate::catalog::PathCatalog`].
pub type PathId = u32;

/// Dense id assigned to a distinct [`DayKey`] in first-seen order, local to a
/// slice or global to the merged aggregate depending on context.
pub type DayId = u32;

/// The 10-byte `YYYY-MM-DD` prefix of a record's timestamp field.
///
/// Lexicographic byte order coincides with chronological order for ISO dates,
/// which the emitter relies on for both the `sort` and `scan` strategies.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct DayKey([u8; DAY_LEN]);

/// Length in bytes of a [`DayKey`] (`YYYY-MM-DD`).
pub const DAY_LEN: usize = 10;

impl DayKey {
    /// Build a `DayKey` from exactly [`DAY_LEN`] bytes.
    ///
    /// Panics if `bytes.len() != DAY_LEN` — callers only ever slice a fixed
    /// window out of a validated record, so a mismatch is a parser bug.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = [0u8; DAY_LEN];
        buf.copy_from_slice(bytes);
        Self(buf)
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????-??-??")
    }
}

impl std::fmt::Display for DayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn day_key_orders_lexicographically() {
        let a = DayKey::from_bytes(b"2026-01-24");
        let b = DayKey::from_bytes(b"2026-01-25");
        assert!(a < b);
    }

    #[test]
    fn day_key_round_trips_as_str() {
        let d = DayKey::from_bytes(b"2026-07-27");
        assert_eq!(d.as_str(), "2026-07-27");
    }
}

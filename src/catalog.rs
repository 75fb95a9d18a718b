//! The path catalog: the read-only mapping from known URL paths to dense ids.
//!
//! Built once per process from an externally supplied `(id, uri)` iterable
//! (see `crate::config` for where that iterable comes from in the CLI) and
//! shared read-only across every slice worker.

use std::collections::HashMap;

use crate::types::PathId;

/// Fixed literal every valid record begins with.
pub const PATH_PREFIX: &[u8] = b"https://stitcher.io";

/// Length of [`PATH_PREFIX`] in bytes.
pub const PATH_PREFIX_LEN: usize = PATH_PREFIX.len();

/// Length of the trailing ISO-8601 timestamp field.
pub const TIMESTAMP_LEN: usize = 25;

/// Minimum total line length: prefix + comma + timestamp, with a zero-length path.
pub const RECORD_TAIL_LEN: usize = PATH_PREFIX_LEN + 1 + TIMESTAMP_LEN;

/// Read-only mapping between known paths and their dense [`PathId`]s.
///
/// `escaped_by_id` holds the JSON-path-escaped form (`/` -> `\/`) so the
/// emitter never re-escapes a path on the hot path; `id_by_path` is keyed by
/// raw path bytes so the slice parser can look records up without an
/// intermediate UTF-8 conversion.
#[derive(Debug, Default)]
pub struct PathCatalog {
    escaped_by_id: HashMap<PathId, Box<str>>,
    id_by_path: HashMap<Box<[u8]>, PathId>,
}

impl PathCatalog {
    /// Build a catalog from `(id, uri)` pairs.
    ///
    /// A pair is dropped unless `uri` is non-empty and begins with
    /// [`PATH_PREFIX`]. No other validation is performed — the catalog trusts
    /// its source not to hand it paths containing JSON-special characters
    /// other than `/`.
    pub fn build<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (PathId, String)>,
    {
        let mut escaped_by_id = HashMap::new();
        let mut id_by_path = HashMap::new();

        for (id, uri) in pairs {
            if uri.is_empty() || !uri.as_bytes().starts_with(PATH_PREFIX) {
                continue;
            }
            let path = &uri[PATH_PREFIX_LEN..];
            let escaped = path.replace('/', "\\/").into_boxed_str();
            id_by_path.insert(path.as_bytes().to_vec().into_boxed_slice(), id);
            escaped_by_id.insert(id, escaped);
        }

        Self {
            escaped_by_id,
            id_by_path,
        }
    }

    /// Number of distinct known paths, `P` in the spec.
    pub fn len(&self) -> usize {
        self.escaped_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.escaped_by_id.is_empty()
    }

    /// Look up the dense id for a raw path byte slice, if known.
    pub fn lookup(&self, path: &[u8]) -> Option<PathId> {
        self.id_by_path.get(path).copied()
    }

    /// The pre-escaped path string for a given id, if it's a known id.
    pub fn escaped_path(&self, id: PathId) -> Option<&str> {
        self.escaped_by_id.get(&id).map(|s| s.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drops_pairs_with_wrong_prefix() {
        let cat = PathCatalog::build(vec![
            (0, "https://stitcher.io/a".to_string()),
            (1, "https://example.com/b".to_string()),
            (2, String::new()),
        ]);
        assert_eq!(cat.len(), 1);
        assert_eq!(cat.lookup(b"/a"), Some(0));
        assert_eq!(cat.lookup(b"/b"), None);
    }

    #[test]
    fn escapes_forward_slashes_json_style() {
        let cat = PathCatalog::build(vec![(0, "https://stitcher.io/blog/post".to_string())]);
        assert_eq!(cat.escaped_path(0), Some("\\/blog\\/post"));
    }

    #[test]
    fn empty_catalog_reports_zero_paths() {
        let cat = PathCatalog::build(Vec::<(PathId, String)>::new());
        assert!(cat.is_empty());
        assert_eq!(cat.len(), 0);
    }
}

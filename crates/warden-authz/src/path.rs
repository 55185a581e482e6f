//! Dot-path lookup into a context tree.
//!
//! This is the only place the engine reads untyped data. A path like
//! `resource.attributes.companyId` walks objects by key; a segment that parses
//! as an integer also indexes arrays (`request.headers.accept.0`).

use serde_json::Value;

/// Resolve `path` against `root`.
///
/// Returns `None` for a missing segment, a scalar in the middle of the path,
/// an out-of-range index or a `null` leaf. Never panics.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

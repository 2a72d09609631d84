//! Extension to MIME hint table used for the advisory accept string.
//!
//! Registrations are additive and first-wins: the seeded defaults cannot be
//! overridden, and neither can an earlier caller registration.

use std::sync::LazyLock;

use dashmap::DashMap;

const DEFAULT_HINTS: &[(&str, &str)] = &[
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("txt", "text/plain"),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("zip", "application/zip"),
];

static HINTS: LazyLock<DashMap<String, String>> = LazyLock::new(|| {
    DEFAULT_HINTS
        .iter()
        .map(|(ext, mime)| ((*ext).to_string(), (*mime).to_string()))
        .collect()
});

/// Register an extension hint. The first registration for a given
/// extension wins; later calls for the same key are ignored.
pub fn register(ext: &str, mime: &str) {
    HINTS
        .entry(ext.to_ascii_lowercase())
        .or_insert_with(|| mime.to_string());
}

/// Look up the hint for a single extension.
pub fn lookup(ext: &str) -> Option<String> {
    HINTS.get(&ext.to_ascii_lowercase()).map(|v| v.clone())
}

/// Build an advisory accept string from a comma-separated extension list.
///
/// Entries that already look like a MIME type (contain a `/`) pass through
/// unchanged; plain extensions are resolved against the hint table and
/// silently skipped when unknown. Returns `None` when nothing resolves.
pub fn accept_hint(accept_types: &str) -> Option<String> {
    let resolved: Vec<String> = accept_types
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            if entry.contains('/') {
                Some(entry.to_string())
            } else {
                lookup(entry)
            }
        })
        .collect();

    if resolved.is_empty() {
        None
    } else {
        Some(resolved.join(","))
    }
}

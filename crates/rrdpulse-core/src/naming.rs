//! Identifier rules for round-robin data sources.
//!
//! A data-source name must be 1 to 19 characters long in `[A-Za-z0-9_-]`.
//! HTTP bases are capped at 14 so the `_cnt`/`_cerr`/`_serr`/`_lat`/`_mlat`
//! suffixes still fit. Normalization is lossy and never fails: two inputs can
//! collapse onto the same name, and their series are then merged.

/// Store-imposed ceiling on data-source identifiers.
pub const DS_NAME_MAX: usize = 19;

/// Ceiling on an HTTP base name, leaving room for the longest suffix.
pub const BASE_NAME_MAX: usize = 14;

/// Base name for requests that match no registered route.
pub const UNKNOWN_ROUTE: &str = "unknown";

/// Fallback when a plain metric name normalizes to nothing.
const UNNAMED: &str = "unnamed";

fn is_ds_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Keep only `[A-Za-z0-9_-]` and cap the length. Every kept char is ASCII, so
/// byte truncation is safe.
fn filter_truncate(raw: &str, max: usize) -> String {
    let mut out: String = raw.chars().filter(|c| is_ds_char(*c)).collect();
    out.truncate(max);
    out
}

/// Normalize an arbitrary metric name into a valid data-source identifier.
pub fn normalize_ds_name(raw: &str) -> String {
    let name = filter_truncate(raw, DS_NAME_MAX);
    if name.is_empty() {
        UNNAMED.to_string()
    } else {
        name
    }
}

/// Normalize an explicit HTTP base name (no path mapping, just charset/length).
pub fn normalize_base(raw: &str) -> String {
    let name = filter_truncate(raw, BASE_NAME_MAX);
    if name.is_empty() {
        UNKNOWN_ROUTE.to_string()
    } else {
        name
    }
}

/// Build an HTTP base name out of a route path or pattern.
///
/// `/` becomes `root`; leading and trailing slashes are stripped; inner
/// slashes and spaces become `_`; anything outside `[A-Za-z0-9_-]` is dropped;
/// the result is cut to 14 characters.
///
/// Slashes map to `_` before filtering, so `/a b/c!d` gives `a_b_cd`, not `a_bcd`.
pub fn route_metric(path: &str) -> String {
    let path = if path == "/" { "root" } else { path };
    let joined = path.trim_matches('/').replace(['/', ' '], "_");
    normalize_base(&joined)
}

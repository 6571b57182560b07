//! Parsing helpers for vendor response bodies and URL templates.

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder in a vendor URL replaced by the requested count.
pub const COUNT_PLACEHOLDER: &str = "${num}";

static PROXY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+:[0-9]+$").expect("valid proxy token regex")
});

/// Check that `body` holds nothing but `ip:port` tokens separated by `splitter`.
///
/// Empty fields are ignored but an empty body is rejected. Fields are not
/// trimmed, so stray whitespace makes the body invalid.
pub fn is_proxy_list_only(body: &str, splitter: &str) -> bool {
    if body.is_empty() {
        return false;
    }
    body.split(splitter)
        .filter(|field| !field.is_empty())
        .all(|field| PROXY_TOKEN.is_match(field))
}

/// Split a validated body into trimmed, non-empty raw candidates.
pub fn split_proxy_list(body: &str, splitter: &str) -> Vec<String> {
    body.split(splitter)
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Replace every `${num}` in `template` with `count`.
///
/// Templates without the placeholder are returned verbatim.
pub fn fill_count_placeholder(template: &str, count: usize) -> String {
    if !template.contains(COUNT_PLACEHOLDER) {
        return template.to_string();
    }
    template.replace(COUNT_PLACEHOLDER, &count.to_string())
}

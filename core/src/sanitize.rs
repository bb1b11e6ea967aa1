//! Removal of SQL-structural sequences from raw search text.
//!
//! This is a denylist filter layered under literal escaping, not a parser.
//! FTS5 match syntax (`AND`, `OR`, `NOT`, `NEAR`, phrase quotes, `*`
//! wildcards and `{col}:` filters) passes through untouched. Denylisted
//! keywords are removed wherever they appear, including inside words and
//! phrases.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static DENYLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i);|--|/\*|\*/|UNION|DROP|DELETE|INSERT|UPDATE|CREATE")
        .expect("static regex must compile")
});

/// Strips denylisted sequences and trims surrounding whitespace.
///
/// Removal repeats until no denylisted sequence remains, so text such as
/// `DRDROPOP` cannot reassemble a keyword and the function is idempotent.
/// The result may be empty; callers decide whether that is an error.
///
/// # Examples
///
/// ```
/// use fts_schema_core::sanitize_query;
///
/// assert_eq!(sanitize_query("DROP TABLE users; SELECT"), "TABLE users SELECT");
/// assert_eq!(sanitize_query("\"exact phrase\" OR pre*"), "\"exact phrase\" OR pre*");
/// assert_eq!(sanitize_query(" ;-- "), "");
/// ```
pub fn sanitize_query(raw: &str) -> String {
    let mut text = raw.to_string();
    while DENYLIST_RE.is_match(&text) {
        text = DENYLIST_RE.replace_all(&text, "").into_owned();
    }
    let sanitized = text.trim();
    if sanitized.len() != raw.trim().len() {
        debug!(
            removed = raw.trim().len() - sanitized.len(),
            "Removed disallowed sequences from search text"
        );
    }
    sanitized.to_string()
}

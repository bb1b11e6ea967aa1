//! SQL literal and identifier quoting.
//!
//! Every compiler in this crate interpolates user-influenced text through
//! these functions and nowhere else. FTS5 DDL does not accept bound
//! parameters for table options, so consistent escaping is the injection
//! boundary for generated SQL.

/// Doubles embedded single quotes so `text` can sit inside `'...'`.
///
/// # Examples
///
/// ```
/// use fts_schema_core::escape_literal;
///
/// assert_eq!(escape_literal("it's"), "it''s");
/// ```
pub fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Wraps `text` in single quotes, doubling embedded quotes.
///
/// # Examples
///
/// ```
/// use fts_schema_core::quote_literal;
///
/// assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
/// ```
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", escape_literal(text))
}

/// Wraps `name` in double quotes, doubling embedded double quotes.
///
/// # Examples
///
/// ```
/// use fts_schema_core::quote_identifier;
///
/// assert_eq!(quote_identifier("articles_fts"), "\"articles_fts\"");
/// assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Returns `true` if `name` can be emitted without quoting.
///
/// Bare identifiers start with an ASCII letter or underscore and continue
/// with ASCII letters, digits or underscores.
pub fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Emits `name` bare when it is a bare identifier, quoted otherwise.
///
/// # Examples
///
/// ```
/// use fts_schema_core::column_identifier;
///
/// assert_eq!(column_identifier("title"), "title");
/// assert_eq!(column_identifier("x) DROP"), "\"x) DROP\"");
/// ```
pub fn column_identifier(name: &str) -> String {
    if is_bare_identifier(name) {
        name.to_string()
    } else {
        quote_identifier(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_literal_doubles_every_quote() {
        assert_eq!(escape_literal("''"), "''''");
        assert_eq!(escape_literal("plain"), "plain");
    }

    #[test]
    fn test_quote_literal_neutralizes_breakout() {
        let quoted = quote_literal("x'); DROP TABLE t; --");
        assert_eq!(quoted, "'x''); DROP TABLE t; --'");
    }

    #[test]
    fn test_is_bare_identifier() {
        assert!(is_bare_identifier("title"));
        assert!(is_bare_identifier("_rowid2"));
        assert!(!is_bare_identifier(""));
        assert!(!is_bare_identifier("2col"));
        assert!(!is_bare_identifier("with space"));
        assert!(!is_bare_identifier("a-b"));
        assert!(!is_bare_identifier("naïve"));
    }

    #[test]
    fn test_column_identifier_quotes_only_when_needed() {
        assert_eq!(column_identifier("body"), "body");
        assert_eq!(column_identifier("a b"), "\"a b\"");
        assert_eq!(column_identifier("x\"); --"), "\"x\"\"); --\"");
    }
}

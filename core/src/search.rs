//! Ranked `MATCH` query generation.
//!
//! A [`SearchRequest`] compiles to a single `SELECT` over the FTS5 table:
//!
//! ```text
//! SELECT *, bm25("name") AS rank, snippet("name", -1, '<mark>', '</mark>', '...', 32) AS snippet FROM "name" WHERE "name" MATCH '{title body} : hello' ORDER BY rank LIMIT 50 OFFSET 0;
//! ```
//!
//! Query text is sanitized with [`sanitize_query`] and every interpolated
//! literal goes through [`quote_literal`]. The output is a pure function of
//! the table name and request, so identical inputs always yield identical
//! SQL.

use crate::error::SearchError;
use crate::quote::{is_bare_identifier, quote_identifier, quote_literal};
use crate::sanitize::sanitize_query;
use crate::{DEFAULT_BM25_B, DEFAULT_BM25_K1, RankingFunction, SearchRequest};

/// Output of [`compile_search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSearch {
    /// Ranked, paginated `SELECT` statement.
    pub query: String,
    /// Whether the result rows carry a `snippet` column.
    pub include_snippet: bool,
}

/// Compiles a search request into a ranked `SELECT ... MATCH` statement.
///
/// # Errors
///
/// - [`SearchError::EmptyQuery`] if nothing remains of the query text after
///   sanitization.
/// - [`SearchError::InvalidLimit`] for a zero limit.
/// - [`SearchError::InvalidColumn`] for a filter column that is not a bare
///   identifier, or an empty filter list.
/// - [`SearchError::InvalidRankingParameter`] for a non-finite or negative
///   `k1`, or a `b` outside `0..=1`.
/// - [`SearchError::InvalidSnippetTokens`] for a zero snippet token count.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{SearchRequest, compile_search};
///
/// let request = SearchRequest::new("hello world").with_limit(10);
/// let compiled = compile_search("articles_fts", &request).unwrap();
/// assert_eq!(
///     compiled.query,
///     r#"SELECT *, bm25("articles_fts") AS rank FROM "articles_fts" WHERE "articles_fts" MATCH 'hello world' ORDER BY rank LIMIT 10 OFFSET 0;"#,
/// );
/// assert!(!compiled.include_snippet);
/// ```
pub fn compile_search(table: &str, request: &SearchRequest) -> Result<CompiledSearch, SearchError> {
    let predicate = match_predicate(table, request)?;
    let table_ident = quote_identifier(table);

    let mut select = vec!["*".to_string(), format!("{} AS rank", rank_expression(table, request)?)];

    if request.include_snippet {
        let options = request.snippet_options.clone().unwrap_or_default();
        let tokens = options.token_count();
        if tokens == 0 {
            return Err(SearchError::InvalidSnippetTokens);
        }
        select.push(format!(
            "snippet({table_ident}, -1, {}, {}, {}, {tokens}) AS snippet",
            quote_literal(options.start_mark()),
            quote_literal(options.end_mark()),
            quote_literal(options.ellipsis()),
        ));
    }

    let query = format!(
        "SELECT {} FROM {table_ident} WHERE {predicate} ORDER BY rank LIMIT {} OFFSET {};",
        select.join(", "),
        request.limit,
        request.offset,
    );

    Ok(CompiledSearch {
        query,
        include_snippet: request.include_snippet,
    })
}

/// Compiles the companion total-count query for a search request.
///
/// Uses the same `MATCH` predicate as [`compile_search`] without ranking or
/// pagination, so the count is independent of `limit` and `offset`.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{SearchRequest, compile_count};
///
/// let sql = compile_count("docs", &SearchRequest::new("rust").with_columns(["title"])).unwrap();
/// assert_eq!(sql, r#"SELECT COUNT(*) AS total FROM "docs" WHERE "docs" MATCH '{title} : rust';"#);
/// ```
pub fn compile_count(table: &str, request: &SearchRequest) -> Result<String, SearchError> {
    let predicate = match_predicate(table, request)?;
    Ok(format!(
        "SELECT COUNT(*) AS total FROM {} WHERE {predicate};",
        quote_identifier(table)
    ))
}

/// Checks that every filter column of `request` is one of `available`.
///
/// # Errors
///
/// Returns [`SearchError::InvalidColumn`] naming the first unknown column.
pub fn check_columns(request: &SearchRequest, available: &[String]) -> Result<(), SearchError> {
    let Some(columns) = &request.columns else {
        return Ok(());
    };
    match columns.iter().find(|c| !available.contains(c)) {
        Some(unknown) => Err(SearchError::InvalidColumn(unknown.clone())),
        None => Ok(()),
    }
}

fn match_predicate(table: &str, request: &SearchRequest) -> Result<String, SearchError> {
    if request.limit == 0 {
        return Err(SearchError::InvalidLimit);
    }

    let text = sanitize_query(&request.query);
    if text.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let expression = match &request.columns {
        Some(columns) => {
            if columns.is_empty() {
                return Err(SearchError::InvalidColumn(String::new()));
            }
            if let Some(bad) = columns.iter().find(|c| !is_bare_identifier(c)) {
                return Err(SearchError::InvalidColumn(bad.clone()));
            }
            format!("{{{}}} : {text}", columns.join(" "))
        }
        None => text,
    };

    Ok(format!(
        "{} MATCH {}",
        quote_identifier(table),
        quote_literal(&expression)
    ))
}

fn rank_expression(table: &str, request: &SearchRequest) -> Result<String, SearchError> {
    let table_ident = quote_identifier(table);
    match request.ranking_function {
        RankingFunction::Bm25 => Ok(format!("bm25({table_ident})")),
        RankingFunction::Bm25Custom => {
            let k1 = request.bm25_k1.unwrap_or(DEFAULT_BM25_K1);
            let b = request.bm25_b.unwrap_or(DEFAULT_BM25_B);
            if !k1.is_finite() || k1 < 0.0 {
                return Err(SearchError::InvalidRankingParameter {
                    name: "k1",
                    value: k1,
                });
            }
            if !(0.0..=1.0).contains(&b) {
                return Err(SearchError::InvalidRankingParameter { name: "b", value: b });
            }
            Ok(format!("bm25({table_ident}, {k1:?}, {b:?})"))
        }
    }
}

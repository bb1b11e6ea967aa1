//! Data model for FTS5 index definitions and search requests.
//!
//! These types describe what an index *is* (its columns, tokenizer, prefix
//! indexes and external-content linkage) and what a search *asks for*. They
//! are plain data: compiling them into SQL happens in the sibling modules.
//! All types serialize with [`serde`] using the camelCase keys a form or a
//! definition file would carry (`tableName`, `contentRowId`, ...), except the
//! tokenizer parameters which keep the FTS5 option names
//! (`remove_diacritics`, `case_sensitive`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default page size for a [`SearchRequest`].
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Default BM25 term-frequency saturation parameter.
pub const DEFAULT_BM25_K1: f64 = 1.2;

/// Default BM25 length-normalization parameter.
pub const DEFAULT_BM25_B: f64 = 0.75;

/// Default snippet highlight opening marker.
pub const DEFAULT_SNIPPET_START: &str = "<mark>";

/// Default snippet highlight closing marker.
pub const DEFAULT_SNIPPET_END: &str = "</mark>";

/// Default snippet ellipsis text.
pub const DEFAULT_SNIPPET_ELLIPSIS: &str = "...";

/// Default number of tokens in a snippet.
pub const DEFAULT_SNIPPET_TOKENS: u32 = 32;

/// Built-in FTS5 tokenizer.
///
/// Parsing an unknown name fails with [`ConfigError::InvalidTokenizerType`],
/// which is how the first validation rule (a known tokenizer type) is
/// enforced for text coming from forms or definition files.
///
/// # Examples
///
/// ```
/// use fts_schema_core::TokenizerType;
///
/// let kind: TokenizerType = "porter".parse().unwrap();
/// assert_eq!(kind, TokenizerType::Porter);
/// assert_eq!(kind.as_str(), "porter");
///
/// let err = "icu".parse::<TokenizerType>().unwrap_err();
/// assert_eq!(err.to_string(), "Invalid tokenizer type: icu");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TokenizerType {
    /// Unicode-aware word tokenizer (the FTS5 default).
    #[default]
    Unicode61,
    /// Porter stemming wrapper around `unicode61`.
    Porter,
    /// Character trigram tokenizer, used for substring matching.
    Trigram,
    /// ASCII-only word tokenizer.
    Ascii,
}

impl TokenizerType {
    /// All known tokenizer types, in declaration order.
    pub const ALL: [TokenizerType; 4] = [
        TokenizerType::Unicode61,
        TokenizerType::Porter,
        TokenizerType::Trigram,
        TokenizerType::Ascii,
    ];

    /// Returns the name FTS5 uses for this tokenizer.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenizerType::Unicode61 => "unicode61",
            TokenizerType::Porter => "porter",
            TokenizerType::Trigram => "trigram",
            TokenizerType::Ascii => "ascii",
        }
    }
}

impl fmt::Display for TokenizerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenizerType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenizerType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidTokenizerType(s.to_string()))
    }
}

impl TryFrom<String> for TokenizerType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenizerType> for String {
    fn from(kind: TokenizerType) -> Self {
        kind.as_str().to_string()
    }
}

/// Optional tokenizer arguments.
///
/// Numeric options are stored as raw integers so that out-of-range values
/// coming from user input can be represented and then rejected by
/// [`validate_tokenizer`](crate::validate_tokenizer).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerParameters {
    /// Diacritic folding mode (`0`, `1` or `2`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_diacritics: Option<u8>,
    /// Unicode categories treated as token characters (e.g. `"L* N* Co"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
    /// Extra characters treated as part of tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenchars: Option<String>,
    /// Extra characters treated as separators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separators: Option<String>,
    /// Case sensitivity (`0` or `1`); only meaningful for `trigram`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<u8>,
}

impl TokenizerParameters {
    /// Returns `true` when no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.remove_diacritics.is_none()
            && self.categories.is_none()
            && self.tokenchars.is_none()
            && self.separators.is_none()
            && self.case_sensitive.is_none()
    }
}

/// A tokenizer and its optional arguments.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{TokenizerConfig, TokenizerType};
///
/// let plain = TokenizerConfig::new(TokenizerType::Unicode61);
/// assert!(plain.parameters.is_none());
///
/// let folded = TokenizerConfig::new(TokenizerType::Porter).with_remove_diacritics(1);
/// assert_eq!(folded.parameters.unwrap().remove_diacritics, Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Tokenizer type.
    #[serde(rename = "type")]
    pub kind: TokenizerType,
    /// Tokenizer arguments, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<TokenizerParameters>,
}

impl TokenizerConfig {
    /// Creates a tokenizer configuration with no parameters.
    pub fn new(kind: TokenizerType) -> Self {
        Self {
            kind,
            parameters: None,
        }
    }

    /// Replaces the parameter set.
    pub fn with_parameters(mut self, parameters: TokenizerParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Sets `remove_diacritics`.
    pub fn with_remove_diacritics(mut self, value: u8) -> Self {
        self.parameters_mut().remove_diacritics = Some(value);
        self
    }

    /// Sets `categories`.
    pub fn with_categories(mut self, value: &str) -> Self {
        self.parameters_mut().categories = Some(value.to_string());
        self
    }

    /// Sets `tokenchars`.
    pub fn with_tokenchars(mut self, value: &str) -> Self {
        self.parameters_mut().tokenchars = Some(value.to_string());
        self
    }

    /// Sets `separators`.
    pub fn with_separators(mut self, value: &str) -> Self {
        self.parameters_mut().separators = Some(value.to_string());
        self
    }

    /// Sets `case_sensitive`.
    pub fn with_case_sensitive(mut self, value: u8) -> Self {
        self.parameters_mut().case_sensitive = Some(value);
        self
    }

    fn parameters_mut(&mut self) -> &mut TokenizerParameters {
        self.parameters.get_or_insert_with(TokenizerParameters::default)
    }
}

/// Auxiliary prefix index configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixIndexConfig {
    /// Whether prefix indexes are emitted at all.
    pub enabled: bool,
    /// Prefix lengths (in characters) to index, in emission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lengths: Vec<u32>,
}

impl PrefixIndexConfig {
    /// Creates an enabled prefix index over the given lengths.
    pub fn with_lengths(lengths: impl IntoIterator<Item = u32>) -> Self {
        Self {
            enabled: true,
            lengths: lengths.into_iter().collect(),
        }
    }
}

/// Full description of an FTS5 virtual table.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{TableDefinition, TokenizerConfig, TokenizerType};
///
/// let def = TableDefinition::new("articles_fts", ["title", "body", "slug"])
///     .with_tokenizer(TokenizerConfig::new(TokenizerType::Porter))
///     .with_unindexed("slug")
///     .with_content("articles", Some("id"));
///
/// assert_eq!(def.columns.len(), 3);
/// assert!(def.is_unindexed("slug"));
/// assert_eq!(def.content_table.as_deref(), Some("articles"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    /// Name of the virtual table.
    pub table_name: String,
    /// Indexed columns, in order.
    pub columns: Vec<String>,
    /// Tokenizer used for every column.
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    /// Optional prefix indexes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_index: Option<PrefixIndexConfig>,
    /// External content table backing the index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_table: Option<String>,
    /// Column of the content table used as the index rowid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_row_id: Option<String>,
    /// Columns stored but not indexed. Must be a subset of `columns`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unindexed: Vec<String>,
}

impl TableDefinition {
    /// Creates a definition with the default `unicode61` tokenizer.
    pub fn new<I, S>(table_name: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table_name: table_name.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
            tokenizer: TokenizerConfig::default(),
            prefix_index: None,
            content_table: None,
            content_row_id: None,
            unindexed: Vec::new(),
        }
    }

    /// Sets the tokenizer.
    pub fn with_tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Enables prefix indexes over the given lengths.
    pub fn with_prefix_lengths(mut self, lengths: impl IntoIterator<Item = u32>) -> Self {
        self.prefix_index = Some(PrefixIndexConfig::with_lengths(lengths));
        self
    }

    /// Links the index to an external content table.
    pub fn with_content(mut self, table: &str, row_id: Option<&str>) -> Self {
        self.content_table = Some(table.to_string());
        self.content_row_id = row_id.map(String::from);
        self
    }

    /// Marks a column as `UNINDEXED`.
    pub fn with_unindexed(mut self, column: &str) -> Self {
        if !self.is_unindexed(column) {
            self.unindexed.push(column.to_string());
        }
        self
    }

    /// Returns `true` if `column` is stored but not indexed.
    pub fn is_unindexed(&self, column: &str) -> bool {
        self.unindexed.iter().any(|c| c == column)
    }

    /// Returns the enabled, non-empty prefix lengths, if any.
    pub fn prefix_lengths(&self) -> Option<&[u32]> {
        self.prefix_index
            .as_ref()
            .filter(|p| p.enabled && !p.lengths.is_empty())
            .map(|p| p.lengths.as_slice())
    }
}

/// A table definition recovered from stored SQL.
///
/// Every field is optional: `None` means the decompiler could not recover
/// it, which callers must display as "unknown" rather than "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialTableDefinition {
    /// Recovered table name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Recovered column list, in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Recovered tokenizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<TokenizerConfig>,
    /// Recovered prefix index configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_index: Option<PrefixIndexConfig>,
    /// Recovered external content table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_table: Option<String>,
    /// Recovered external content rowid column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_row_id: Option<String>,
    /// Recovered unindexed columns (absent when none were marked).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unindexed: Option<Vec<String>>,
}

impl PartialTableDefinition {
    /// Converts into a full definition when the name and columns are known.
    ///
    /// A missing tokenizer falls back to `unicode61`, the tokenizer FTS5
    /// itself uses when none is declared.
    pub fn into_definition(self) -> Option<TableDefinition> {
        let table_name = self.table_name?;
        let columns = self.columns?;
        Some(TableDefinition {
            table_name,
            columns,
            tokenizer: self.tokenizer.unwrap_or_default(),
            prefix_index: self.prefix_index,
            content_table: self.content_table,
            content_row_id: self.content_row_id,
            unindexed: self.unindexed.unwrap_or_default(),
        })
    }
}

/// Ranking function used to order search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingFunction {
    /// `bm25(table)` with the engine's built-in parameters.
    #[default]
    Bm25,
    /// `bm25(table, k1, b)` with caller-supplied parameters.
    #[serde(rename = "bm25custom")]
    Bm25Custom,
}

/// Highlight options for the `snippet()` column. Unset fields use defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetOptions {
    /// Text inserted before each matched token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_mark: Option<String>,
    /// Text inserted after each matched token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_mark: Option<String>,
    /// Text marking elided content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ellipsis: Option<String>,
    /// Maximum number of tokens in the snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
}

impl SnippetOptions {
    /// Opening marker, or `<mark>`.
    pub fn start_mark(&self) -> &str {
        self.start_mark.as_deref().unwrap_or(DEFAULT_SNIPPET_START)
    }

    /// Closing marker, or `</mark>`.
    pub fn end_mark(&self) -> &str {
        self.end_mark.as_deref().unwrap_or(DEFAULT_SNIPPET_END)
    }

    /// Ellipsis, or `...`.
    pub fn ellipsis(&self) -> &str {
        self.ellipsis.as_deref().unwrap_or(DEFAULT_SNIPPET_ELLIPSIS)
    }

    /// Token count, or 32.
    pub fn token_count(&self) -> u32 {
        self.token_count.unwrap_or(DEFAULT_SNIPPET_TOKENS)
    }
}

/// A structured full-text search request.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{RankingFunction, SearchRequest};
///
/// let req = SearchRequest::new("hello world")
///     .with_columns(["title"])
///     .with_limit(10)
///     .with_snippet();
/// assert_eq!(req.offset, 0);
/// assert_eq!(req.ranking_function, RankingFunction::Bm25);
/// assert!(req.include_snippet);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// FTS5 match expression entered by the user.
    pub query: String,
    /// Restrict matching to these columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Maximum rows returned.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Rows skipped before the first returned row.
    #[serde(default)]
    pub offset: u32,
    /// Ranking function.
    #[serde(default)]
    pub ranking_function: RankingFunction,
    /// BM25 `k1`, used with [`RankingFunction::Bm25Custom`].
    #[serde(default, rename = "bm25_k1", skip_serializing_if = "Option::is_none")]
    pub bm25_k1: Option<f64>,
    /// BM25 `b`, used with [`RankingFunction::Bm25Custom`].
    #[serde(default, rename = "bm25_b", skip_serializing_if = "Option::is_none")]
    pub bm25_b: Option<f64>,
    /// Whether to add a highlighted `snippet` column.
    #[serde(default)]
    pub include_snippet: bool,
    /// Snippet formatting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_options: Option<SnippetOptions>,
}

fn default_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

impl SearchRequest {
    /// Creates a request with default paging and `bm25` ranking.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            columns: None,
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
            ranking_function: RankingFunction::Bm25,
            bm25_k1: None,
            bm25_b: None,
            include_snippet: false,
            snippet_options: None,
        }
    }

    /// Restricts matching to the given columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the page offset.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Switches to custom BM25 ranking with the given parameters.
    pub fn with_bm25(mut self, k1: f64, b: f64) -> Self {
        self.ranking_function = RankingFunction::Bm25Custom;
        self.bm25_k1 = Some(k1);
        self.bm25_b = Some(b);
        self
    }

    /// Requests a snippet column with default formatting.
    pub fn with_snippet(mut self) -> Self {
        self.include_snippet = true;
        self
    }

    /// Requests a snippet column with the given formatting.
    pub fn with_snippet_options(mut self, options: SnippetOptions) -> Self {
        self.include_snippet = true;
        self.snippet_options = Some(options);
        self
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Column values of the matched row.
    pub row: serde_json::Map<String, serde_json::Value>,
    /// BM25 score; more negative is more relevant.
    pub rank: f64,
    /// Highlighted excerpt, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Row event a trigger fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerEvent {
    /// `AFTER INSERT`.
    Insert,
    /// `AFTER UPDATE`.
    Update,
    /// `AFTER DELETE`.
    Delete,
}

impl TriggerEvent {
    /// SQL keyword for the event.
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        }
    }

    /// Suffix appended to the index name to form the trigger name.
    pub fn suffix(self) -> &'static str {
        match self {
            TriggerEvent::Insert => "_ai",
            TriggerEvent::Update => "_au",
            TriggerEvent::Delete => "_ad",
        }
    }
}

/// A generated synchronization trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    /// Trigger name.
    pub name: String,
    /// Event the trigger fires on.
    pub event: TriggerEvent,
    /// Complete `CREATE TRIGGER` statement.
    pub sql: String,
}

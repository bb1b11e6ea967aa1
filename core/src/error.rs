//! Error types for definition validation and search compilation.
//!
//! [`ConfigError`] blocks table compilation entirely: no SQL is produced for
//! a definition that fails validation. [`SearchError`] is raised by the
//! search compiler, most notably when the query text is empty once
//! disallowed sequences have been stripped.

use thiserror::Error;

/// Invalid tokenizer or table definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Tokenizer name is not one of the built-in FTS5 tokenizers.
    #[error("Invalid tokenizer type: {0}")]
    InvalidTokenizerType(String),
    /// `remove_diacritics` outside `0..=2`.
    #[error("remove_diacritics must be 0, 1, or 2 (got {0})")]
    InvalidRemoveDiacritics(u8),
    /// `case_sensitive` set on a tokenizer other than `trigram`.
    #[error("case_sensitive is only valid for trigram tokenizer")]
    CaseSensitiveRequiresTrigram,
    /// `case_sensitive` outside `0..=1`.
    #[error("case_sensitive must be 0 or 1 (got {0})")]
    InvalidCaseSensitive(u8),
    /// Table name is empty or whitespace-only.
    #[error("table name cannot be empty")]
    EmptyTableName,
    /// Definition has no columns.
    #[error("table must define at least one column")]
    NoColumns,
    /// Column name is not a bare SQL identifier.
    #[error("invalid column name: '{0}'")]
    InvalidColumnName(String),
    /// Two columns share a name.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    /// An unindexed column is not one of the table's columns.
    #[error("unindexed column '{0}' is not a table column")]
    UnknownUnindexedColumn(String),
    /// `contentRowId` was set without `contentTable`.
    #[error("content_rowid requires a content table")]
    ContentRowIdWithoutContentTable,
    /// Content table or rowid column is not a bare SQL identifier.
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    /// Prefix length outside the range FTS5 accepts.
    #[error("prefix length must be between 1 and 999 (got {0})")]
    InvalidPrefixLength(u32),
    /// Trigger synthesis requested for an index without external content.
    #[error("index '{0}' has no content table to synchronize with")]
    MissingContentTable(String),
}

/// Invalid search request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// Query text was empty after sanitization.
    #[error("search query is empty after removing disallowed characters; enter words to search for")]
    EmptyQuery,
    /// Page size of zero.
    #[error("limit must be a positive integer")]
    InvalidLimit,
    /// Column filter names a column that is empty, malformed, or absent.
    #[error("invalid search column: '{0}'")]
    InvalidColumn(String),
    /// BM25 parameter out of range.
    #[error("invalid bm25 parameter {name}: {value}")]
    InvalidRankingParameter {
        /// Parameter name (`k1` or `b`).
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Snippet token count of zero.
    #[error("snippet token count must be a positive integer")]
    InvalidSnippetTokens,
}

/// Result of validating a tokenizer configuration.
///
/// This is the report shape shown to form users: a flag plus an optional
/// human-readable reason.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{TokenizerConfig, TokenizerType, ValidationResult, validate_tokenizer};
///
/// let cfg = TokenizerConfig::new(TokenizerType::Unicode61).with_case_sensitive(1);
/// let result = ValidationResult::from(validate_tokenizer(&cfg));
/// assert!(!result.valid);
/// assert_eq!(
///     result.error.as_deref(),
///     Some("case_sensitive is only valid for trigram tokenizer"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationResult {
    /// Whether the configuration is valid.
    pub valid: bool,
    /// Reason the configuration is invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), ConfigError>> for ValidationResult {
    fn from(result: Result<(), ConfigError>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                error: None,
            },
            Err(err) => Self {
                valid: false,
                error: Some(err.to_string()),
            },
        }
    }
}

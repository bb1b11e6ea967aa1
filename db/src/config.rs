//! Engine configuration.
//!
//! Defines the YAML-serializable defaults applied to search requests and
//! index creation. Every section is optional; missing keys take the values
//! shown below.
//!
//! # Example YAML
//!
//! ```yaml
//! search:
//!   default_limit: 50
//!   max_limit: 1000
//!   ranking: bm25
//!   bm25_k1: 1.2
//!   bm25_b: 0.75
//!   snippet:
//!     start_mark: "<mark>"
//!     end_mark: "</mark>"
//!     ellipsis: "..."
//!     token_count: 32
//! index:
//!   default_tokenizer: unicode61
//!   create_triggers: true
//!   populate: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use fts_schema_core::{
    DEFAULT_BM25_B, DEFAULT_BM25_K1, DEFAULT_SEARCH_LIMIT, DEFAULT_SNIPPET_ELLIPSIS,
    DEFAULT_SNIPPET_END, DEFAULT_SNIPPET_START, DEFAULT_SNIPPET_TOKENS, RankingFunction,
    SearchRequest, SnippetOptions, TokenizerType,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Snippet formatting defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Text inserted before each matched token.
    pub start_mark: String,
    /// Text inserted after each matched token.
    pub end_mark: String,
    /// Text marking elided content.
    pub ellipsis: String,
    /// Maximum number of tokens per snippet.
    pub token_count: u32,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            start_mark: DEFAULT_SNIPPET_START.to_string(),
            end_mark: DEFAULT_SNIPPET_END.to_string(),
            ellipsis: DEFAULT_SNIPPET_ELLIPSIS.to_string(),
            token_count: DEFAULT_SNIPPET_TOKENS,
        }
    }
}

/// Search defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size used when a request does not specify one.
    pub default_limit: u32,
    /// Upper bound on any requested page size.
    pub max_limit: u32,
    /// Ranking function used unless a request asks for custom BM25.
    pub ranking: RankingFunction,
    /// BM25 `k1` for custom ranking.
    pub bm25_k1: f64,
    /// BM25 `b` for custom ranking.
    pub bm25_b: f64,
    /// Snippet formatting.
    pub snippet: SnippetConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT,
            max_limit: 1000,
            ranking: RankingFunction::Bm25,
            bm25_k1: DEFAULT_BM25_K1,
            bm25_b: DEFAULT_BM25_B,
            snippet: SnippetConfig::default(),
        }
    }
}

/// Index creation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Tokenizer for definitions that do not declare one.
    pub default_tokenizer: TokenizerType,
    /// Create synchronization triggers for external-content indexes.
    pub create_triggers: bool,
    /// Backfill external-content indexes on creation.
    pub populate: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            default_tokenizer: TokenizerType::Unicode61,
            create_triggers: true,
            populate: true,
        }
    }
}

/// Top-level engine configuration.
///
/// # Examples
///
/// ```
/// use fts_schema_db::EngineConfig;
///
/// let config: EngineConfig = serde_yaml::from_str("search:\n  max_limit: 100\n").unwrap();
/// assert_eq!(config.search.max_limit, 100);
/// assert_eq!(config.search.default_limit, 50);
/// assert!(config.index.create_triggers);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Search defaults.
    pub search: SearchConfig,
    /// Index creation defaults.
    pub index: IndexConfig,
}

impl EngineConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::DatabaseError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Creates a request for `query` with the configured page size.
    pub fn search_request(&self, query: &str) -> SearchRequest {
        let mut request = SearchRequest::new(query).with_limit(self.search.default_limit);
        self.apply_search_defaults(&mut request);
        request
    }

    /// Fills unset ranking and snippet fields of `request` from the
    /// configuration and clamps its limit to `max_limit`.
    ///
    /// Explicitly set request fields are never overwritten.
    ///
    /// # Examples
    ///
    /// ```
    /// use fts_schema_core::{RankingFunction, SearchRequest};
    /// use fts_schema_db::EngineConfig;
    ///
    /// let mut config = EngineConfig::default();
    /// config.search.ranking = RankingFunction::Bm25Custom;
    /// config.search.bm25_k1 = 2.0;
    ///
    /// let mut request = SearchRequest::new("q").with_limit(5000);
    /// config.apply_search_defaults(&mut request);
    /// assert_eq!(request.limit, 1000);
    /// assert_eq!(request.ranking_function, RankingFunction::Bm25Custom);
    /// assert_eq!(request.bm25_k1, Some(2.0));
    /// assert_eq!(request.bm25_b, Some(0.75));
    /// ```
    pub fn apply_search_defaults(&self, request: &mut SearchRequest) {
        let search = &self.search;
        request.limit = request.limit.min(search.max_limit);

        if search.ranking == RankingFunction::Bm25Custom {
            request.ranking_function = RankingFunction::Bm25Custom;
        }
        if request.ranking_function == RankingFunction::Bm25Custom {
            request.bm25_k1.get_or_insert(search.bm25_k1);
            request.bm25_b.get_or_insert(search.bm25_b);
        }

        if request.include_snippet {
            let options = request.snippet_options.get_or_insert_with(SnippetOptions::default);
            let defaults = &search.snippet;
            options
                .start_mark
                .get_or_insert_with(|| defaults.start_mark.clone());
            options
                .end_mark
                .get_or_insert_with(|| defaults.end_mark.clone());
            options
                .ellipsis
                .get_or_insert_with(|| defaults.ellipsis.clone());
            options.token_count.get_or_insert(defaults.token_count);
        }
    }
}

//! Compiler and decompiler for SQLite FTS5 index definitions.
//!
//! This crate turns a structured description of a full-text index into the
//! exact SQL that creates, queries, and maintains it, and recovers such a
//! description from stored SQL:
//!
//! - [`TableDefinition`]: columns, tokenizer, prefix indexing, and
//!   external-content linkage of an FTS5 table.
//! - [`compile_table_definition`]: validated `CREATE VIRTUAL TABLE` text.
//! - [`decompile_table_definition`]: best-effort inverse, producing a
//!   [`PartialTableDefinition`] whose absent fields mean "unknown".
//! - [`encode_tokenizer`] / [`decode_tokenizer`]: the `tokenize=` option
//!   codec.
//! - [`compile_search`]: ranked, paginated `MATCH` queries with optional
//!   highlighted snippets.
//! - [`synthesize_triggers`] and [`build_populate_query`]: keep an
//!   external-content index in sync with its source table.
//!
//! Every function is pure: no I/O, no shared state, and identical inputs
//! always produce identical SQL. Executing the SQL is left to the caller.
//!
//! # Example
//!
//! ```
//! use fts_schema_core::*;
//!
//! let def = TableDefinition::new("articles_fts", ["title", "body"])
//!     .with_tokenizer(TokenizerConfig::new(TokenizerType::Porter).with_remove_diacritics(1))
//!     .with_content("articles", None);
//!
//! let ddl = compile_table_definition(&def).unwrap();
//! assert!(ddl.contains("tokenize='porter remove_diacritics 1'"));
//!
//! let recovered = decompile_table_definition(ddl.as_str()).unwrap();
//! assert_eq!(recovered.table_name.as_deref(), Some("articles_fts"));
//! assert_eq!(recovered.tokenizer.as_ref(), Some(&def.tokenizer));
//!
//! let triggers = synthesize_triggers(&TriggerSource::from_definition(&def).unwrap());
//! assert_eq!(triggers.len(), 3);
//!
//! let request = SearchRequest::new("rust").with_snippet();
//! let search = compile_search("articles_fts", &request).unwrap();
//! assert!(search.query.contains("MATCH 'rust'"));
//! ```

mod compile;
pub mod decompile;
mod error;
mod maintenance;
mod populate;
mod quote;
mod sanitize;
mod search;
mod tokenizer;
mod triggers;
mod types;
mod validate;

pub use compile::compile_table_definition;
pub use decompile::decompile_table_definition;
pub use error::{ConfigError, SearchError, ValidationResult};
pub use maintenance::{MaintenanceCommand, drop_table_statement};
pub use populate::{build_populate_query, populate_from_definition};
pub use quote::{
    column_identifier, escape_literal, is_bare_identifier, quote_identifier, quote_literal,
};
pub use sanitize::sanitize_query;
pub use search::{CompiledSearch, check_columns, compile_count, compile_search};
pub use tokenizer::{decode_tokenizer, encode_tokenizer};
pub use triggers::{TriggerSource, drop_trigger_statements, synthesize_triggers};
pub use types::*;
pub use validate::{validate_definition, validate_tokenizer};

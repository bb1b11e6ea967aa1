//! SQLite backend for FTS5 index definitions.
//!
//! This crate executes the SQL produced by
//! [`fts_schema_core`] against a SQLite database (via `rusqlite`, with the
//! bundled SQLite that ships FTS5).
//!
//! # Architecture
//!
//! - **`executor`**: the [`SqlExecutor`] trait and its [`SqliteExecutor`]
//!   implementation, returning rows as JSON mappings plus execution metadata
//! - **`index`**: [`FtsIndexManager`]: create, inspect, search, maintain
//!   and drop indexes
//! - **`convert`**: SQLite value to JSON conversion
//!
//! # Quick start
//!
//! ```no_run
//! use fts_schema_core::{SearchRequest, TableDefinition};
//! use fts_schema_sqlite::{CreateOptions, FtsIndexManager, SqliteExecutor};
//!
//! let manager = FtsIndexManager::new(SqliteExecutor::open("app.db").unwrap());
//!
//! let def = TableDefinition::new("articles_fts", ["title", "body"])
//!     .with_content("articles", None);
//! manager.create(&def, CreateOptions::default()).unwrap();
//!
//! let page = manager
//!     .search("articles_fts", &SearchRequest::new("sqlite").with_snippet())
//!     .unwrap();
//! for hit in &page.results {
//!     println!("{:.3} {:?}", hit.rank, hit.snippet);
//! }
//! ```

mod convert;
mod error;
mod executor;
mod index;

pub use convert::Row;
pub use error::{Result, SqliteError};
pub use executor::{ExecutionMeta, QueryOutput, SqlExecutor, SqliteExecutor};
pub use index::{CreateOptions, CreateReport, FtsIndexManager, SearchPage};

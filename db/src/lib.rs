//! Definition loading, engine configuration, and manifests for FTS5 indexes.
//!
//! This crate provides the on-disk side of `fts-schema`: loading
//! [`TableDefinition`](fts_schema_core::TableDefinition)s from YAML or JSON
//! files, engine-wide defaults, and a manifest that tracks which DDL has
//! been applied to a database.
//!
//! # Quick start
//!
//! ```no_run
//! use fts_schema_core::compile_table_definition;
//! use fts_schema_db::{DefinitionSet, EngineConfig, IndexState, Manifest};
//!
//! let config = EngineConfig::load("fts-schema.yml").unwrap_or_default();
//! let set = DefinitionSet::builder()
//!     .default_tokenizer(config.index.default_tokenizer)
//!     .from_dir("search/indexes/")
//!     .build()
//!     .unwrap();
//!
//! let manifest = Manifest::load_or_new("fts-manifest.json", "0.1.0").unwrap();
//! for entry in set.iter() {
//!     let ddl = compile_table_definition(&entry.definition).unwrap();
//!     if manifest.state_of(&entry.definition.table_name, &ddl) != IndexState::Current {
//!         println!("{} needs to be applied", entry.definition.table_name);
//!     }
//! }
//! ```

mod config;
mod error;
mod loader;
mod manifest;

pub use config::{EngineConfig, IndexConfig, SearchConfig, SnippetConfig};
pub use error::{DatabaseError, Result};
pub use loader::{
    DefinitionBundle, DefinitionEntry, DefinitionSet, DefinitionSetBuilder, DefinitionSource,
    load_definition_file, load_definition_file_with,
};
pub use manifest::{IndexRecord, IndexState, MANIFEST_VERSION, Manifest, ManifestDiff};

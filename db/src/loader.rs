//! Definition loading with builder pattern and fallback chains.
//!
//! Provides [`DefinitionSet`] for keyed access to on-disk
//! [`TableDefinition`]s and [`DefinitionSetBuilder`] for constructing a set
//! from multiple sources with automatic fallback.
//!
//! # Loading patterns
//!
//! ```no_run
//! use fts_schema_db::DefinitionSet;
//!
//! // One definition per *.yaml, *.yml or *.json file
//! let set = DefinitionSet::from_dir("search/indexes/").unwrap();
//! assert!(set.get("articles_fts").is_some());
//!
//! // A single DefinitionBundle file
//! let set = DefinitionSet::from_bundle("indexes.json").unwrap();
//!
//! // Fallback chain
//! let set = DefinitionSet::builder()
//!     .from_dir("search/indexes/")
//!     .from_bundle("indexes.json")
//!     .build()
//!     .unwrap();
//! ```
//!
//! A definition file that omits `tokenizer` receives the loader's default
//! tokenizer (`unicode61` unless configured otherwise).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fts_schema_core::{ConfigError, TableDefinition, TokenizerType, validate_definition};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{DatabaseError, Result};

/// Describes where a [`DefinitionSet`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionSource {
    /// Directory of individual definition files.
    Directory(PathBuf),
    /// Single [`DefinitionBundle`] file.
    Bundle(PathBuf),
    /// Built in memory.
    Memory,
    /// Fallback chain of multiple sources.
    Multiple(Vec<DefinitionSource>),
}

/// A versioned collection of definitions stored in one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionBundle {
    /// Bundle format version.
    pub version: String,
    /// RFC 3339 creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    /// Contained definitions.
    pub definitions: Vec<TableDefinition>,
}

/// A loaded definition and the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionEntry {
    /// The definition.
    pub definition: TableDefinition,
    /// Originating file, when loaded from disk.
    pub path: Option<PathBuf>,
}

/// Definitions keyed by table name, iterated in name order.
#[derive(Debug)]
pub struct DefinitionSet {
    entries: BTreeMap<String, DefinitionEntry>,
    source: DefinitionSource,
}

impl DefinitionSet {
    /// Returns a new [`DefinitionSetBuilder`] for configuring a fallback chain.
    pub fn builder() -> DefinitionSetBuilder {
        DefinitionSetBuilder::new()
    }

    /// Builds a set from in-memory definitions.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuplicateDefinition`] if two definitions
    /// share a table name.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = TableDefinition>,
    ) -> Result<Self> {
        let mut set = Self::empty(DefinitionSource::Memory);
        for definition in definitions {
            set.insert(definition, None)?;
        }
        Ok(set)
    }

    /// Loads every `*.yaml`, `*.yml` and `*.json` file in `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::IoError`] if the directory cannot be read,
    /// [`DatabaseError::InvalidDefinition`] if a file does not parse, or
    /// [`DatabaseError::DuplicateDefinition`] if two files declare the same
    /// table.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_dir_with(path, TokenizerType::Unicode61)
    }

    /// Like [`from_dir`](Self::from_dir) with an explicit default tokenizer.
    pub fn from_dir_with(path: impl AsRef<Path>, default_tokenizer: TokenizerType) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if Format::of(&file_path).is_some() {
                files.push(file_path);
            }
        }
        files.sort();

        let mut set = Self::empty(DefinitionSource::Directory(path.to_path_buf()));
        for file in files {
            let definition = load_definition_file_with(&file, default_tokenizer)?;
            set.insert(definition, Some(file))?;
        }
        debug!(dir = %path.display(), count = set.len(), "Loaded definitions");
        Ok(set)
    }

    /// Loads a [`DefinitionBundle`] from a JSON or YAML file.
    pub fn from_bundle(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bundle_with(path, TokenizerType::Unicode61)
    }

    /// Like [`from_bundle`](Self::from_bundle) with an explicit default tokenizer.
    pub fn from_bundle_with(
        path: impl AsRef<Path>,
        default_tokenizer: TokenizerType,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut value = read_value(path)?;
        if let Some(definitions) = value.get_mut("definitions").and_then(Value::as_array_mut) {
            for definition in definitions {
                insert_default_tokenizer(definition, default_tokenizer);
            }
        }
        let bundle: DefinitionBundle =
            serde_json::from_value(value).map_err(|e| invalid(path, e))?;

        let mut set = Self::empty(DefinitionSource::Bundle(path.to_path_buf()));
        for definition in bundle.definitions {
            set.insert(definition, Some(path.to_path_buf()))?;
        }
        Ok(set)
    }

    fn empty(source: DefinitionSource) -> Self {
        Self {
            entries: BTreeMap::new(),
            source,
        }
    }

    fn insert(&mut self, definition: TableDefinition, path: Option<PathBuf>) -> Result<()> {
        let name = definition.table_name.clone();
        if self.entries.contains_key(&name) {
            return Err(DatabaseError::DuplicateDefinition(name));
        }
        self.entries.insert(name, DefinitionEntry { definition, path });
        Ok(())
    }

    /// Looks up a definition by table name.
    pub fn get(&self, table: &str) -> Option<&TableDefinition> {
        self.entries.get(table).map(|e| &e.definition)
    }

    /// Looks up a definition together with its originating file.
    pub fn entry(&self, table: &str) -> Option<&DefinitionEntry> {
        self.entries.get(table)
    }

    /// Returns `true` if the set contains a definition for `table`.
    pub fn contains(&self, table: &str) -> bool {
        self.entries.contains_key(table)
    }

    /// Returns the number of definitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in table-name order.
    pub fn iter(&self) -> impl Iterator<Item = &DefinitionEntry> {
        self.entries.values()
    }

    /// Iterates over table names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &DefinitionSource {
        &self.source
    }

    /// Validates every definition, returning the failures.
    pub fn validate(&self) -> Vec<(String, ConfigError)> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| {
                validate_definition(&entry.definition)
                    .err()
                    .map(|err| (name.clone(), err))
            })
            .collect()
    }

    /// Packs the set into a bundle stamped with the current time.
    pub fn to_bundle(&self, version: &str) -> DefinitionBundle {
        DefinitionBundle {
            version: version.to_string(),
            generated_at: Some(crate::manifest::now_rfc3339()),
            definitions: self.iter().map(|e| e.definition.clone()).collect(),
        }
    }
}

/// Builder for constructing a [`DefinitionSet`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`DatabaseError::NoSourcesAvailable`] is returned.
///
/// # Example
///
/// ```no_run
/// use fts_schema_core::TokenizerType;
/// use fts_schema_db::DefinitionSet;
///
/// let set = DefinitionSet::builder()
///     .default_tokenizer(TokenizerType::Porter)
///     .from_dir("/etc/app/indexes/")
///     .from_bundle("/usr/share/app/indexes.yaml")
///     .build()
///     .unwrap();
/// ```
pub struct DefinitionSetBuilder {
    sources: Vec<DefinitionSource>,
    default_tokenizer: TokenizerType,
}

impl DefinitionSetBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            default_tokenizer: TokenizerType::Unicode61,
        }
    }

    /// Sets the tokenizer given to definitions that declare none.
    pub fn default_tokenizer(mut self, kind: TokenizerType) -> Self {
        self.default_tokenizer = kind;
        self
    }

    /// Adds a directory of definition files as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DefinitionSource::Directory(path.into()));
        self
    }

    /// Adds a [`DefinitionBundle`] file as a source.
    pub fn from_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DefinitionSource::Bundle(path.into()));
        self
    }

    /// Attempts to load definitions from configured sources in order.
    ///
    /// Returns the first successfully loaded set. If all sources fail,
    /// returns [`DatabaseError::NoSourcesAvailable`].
    pub fn build(self) -> Result<DefinitionSet> {
        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                DefinitionSource::Directory(path) => {
                    DefinitionSet::from_dir_with(path, self.default_tokenizer)
                }
                DefinitionSource::Bundle(path) => {
                    DefinitionSet::from_bundle_with(path, self.default_tokenizer)
                }
                DefinitionSource::Memory | DefinitionSource::Multiple(_) => continue,
            };

            match result {
                Ok(mut set) => {
                    set.source = DefinitionSource::Multiple(all_sources);
                    return Ok(set);
                }
                Err(err) => debug!(source = ?source, error = %err, "Definition source failed"),
            }
        }

        Err(DatabaseError::NoSourcesAvailable)
    }
}

impl Default for DefinitionSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads a single definition file (`.json`, `.yaml` or `.yml`).
///
/// # Errors
///
/// Returns [`DatabaseError::IoError`] if the file cannot be read, or
/// [`DatabaseError::InvalidDefinition`] if it does not parse.
pub fn load_definition_file(path: impl AsRef<Path>) -> Result<TableDefinition> {
    load_definition_file_with(path, TokenizerType::Unicode61)
}

/// Like [`load_definition_file`] with an explicit default tokenizer.
pub fn load_definition_file_with(
    path: impl AsRef<Path>,
    default_tokenizer: TokenizerType,
) -> Result<TableDefinition> {
    let path = path.as_ref();
    let mut value = read_value(path)?;
    insert_default_tokenizer(&mut value, default_tokenizer);
    serde_json::from_value(value).map_err(|e| invalid(path, e))
}

#[derive(Clone, Copy)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Format::Json),
            Some("yaml" | "yml") => Some(Format::Yaml),
            _ => None,
        }
    }
}

fn read_value(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)?;
    match Format::of(path) {
        Some(Format::Json) => serde_json::from_str(&text).map_err(|e| invalid(path, e)),
        // YAML is the fallback; it also accepts JSON documents.
        Some(Format::Yaml) | None => serde_yaml::from_str(&text).map_err(|e| invalid(path, e)),
    }
}

fn insert_default_tokenizer(value: &mut Value, kind: TokenizerType) {
    if let Some(object) = value.as_object_mut() {
        object
            .entry("tokenizer")
            .or_insert_with(|| json!({ "type": kind.as_str() }));
    }
}

fn invalid(path: &Path, err: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::InvalidDefinition {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

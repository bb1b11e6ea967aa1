//! Manifest of applied indexes.
//!
//! The manifest records, per index, the SHA-256 checksum of the DDL that
//! was applied to a database. Comparing it with the DDL compiled from the
//! current definition files tells whether an index must be recreated:
//!
//! - **New**: the definition has never been applied.
//! - **Changed**: the compiled DDL no longer matches the recorded checksum.
//! - **Current**: nothing to do.
//!
//! # Examples
//!
//! ```no_run
//! use fts_schema_db::Manifest;
//!
//! let mut manifest = Manifest::new("0.1.0".into());
//! manifest.record(
//!     "articles_fts",
//!     r#"CREATE VIRTUAL TABLE "articles_fts" USING fts5(title, tokenize='unicode61');"#,
//!     Some("indexes/articles.yaml".into()),
//!     true,
//! );
//!
//! manifest.save("fts-manifest.json").unwrap();
//! let loaded = Manifest::load("fts-manifest.json").unwrap();
//! assert!(loaded.contains("articles_fts"));
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DatabaseError, Result};

/// Current manifest format version.
pub const MANIFEST_VERSION: &str = "1.0";

/// Metadata recorded when an index is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// SHA-256 hex digest of the applied `CREATE VIRTUAL TABLE` statement.
    pub checksum: String,
    /// Definition file the index was compiled from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// RFC 3339 timestamp of when the index was applied.
    pub applied_at: String,
    /// Whether synchronization triggers were created.
    #[serde(default)]
    pub triggers: bool,
}

/// State of a definition relative to the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    /// Never applied.
    New,
    /// Applied with different DDL.
    Changed,
    /// Applied with identical DDL.
    Current,
}

/// Differences between two manifests, each list sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    /// Indexes only in the newer manifest.
    pub added: Vec<String>,
    /// Indexes only in the older manifest.
    pub removed: Vec<String>,
    /// Indexes in both with different checksums.
    pub changed: Vec<String>,
}

impl ManifestDiff {
    /// Returns `true` if the manifests record identical DDL.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Applied-index manifest, persisted as pretty-printed JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version.
    pub version: String,
    /// Version of the tool that wrote the manifest.
    pub tool_version: String,
    /// RFC 3339 timestamp of the last update.
    pub updated_at: String,
    /// Per-index records keyed by table name.
    pub indexes: BTreeMap<String, IndexRecord>,
}

impl Manifest {
    /// Creates a new, empty manifest stamped with the current time.
    pub fn new(tool_version: String) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            tool_version,
            updated_at: now_rfc3339(),
            indexes: BTreeMap::new(),
        }
    }

    /// Loads and validates a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, [`JsonError`](crate::DatabaseError::JsonError) if the
    /// content is not manifest JSON, or
    /// [`InvalidManifest`](crate::DatabaseError::InvalidManifest) if a
    /// record is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest: Manifest = serde_json::from_reader(reader)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Loads the manifest at `path`, or creates an empty one if the file
    /// does not exist.
    pub fn load_or_new(path: impl AsRef<Path>, tool_version: &str) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new(tool_version.to_string()))
        }
    }

    /// Saves the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be written, or [`JsonError`](crate::DatabaseError::JsonError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Checks the format version and that every checksum is a SHA-256 hex
    /// digest.
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(DatabaseError::InvalidManifest("missing version".into()));
        }
        for (name, record) in &self.indexes {
            let valid = record.checksum.len() == 64
                && record.checksum.bytes().all(|b| b.is_ascii_hexdigit());
            if !valid {
                return Err(DatabaseError::InvalidManifest(format!(
                    "index '{name}' has malformed checksum '{}'",
                    record.checksum
                )));
            }
        }
        Ok(())
    }

    /// Computes the SHA-256 hex digest of DDL text.
    ///
    /// # Examples
    ///
    /// ```
    /// use fts_schema_db::Manifest;
    ///
    /// assert_eq!(
    ///     Manifest::checksum(""),
    ///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    /// );
    /// ```
    pub fn checksum(ddl: &str) -> String {
        format!("{:x}", Sha256::digest(ddl.as_bytes()))
    }

    /// Records that `ddl` was applied for `table` and refreshes `updated_at`.
    pub fn record(&mut self, table: &str, ddl: &str, source_file: Option<String>, triggers: bool) {
        let now = now_rfc3339();
        self.indexes.insert(
            table.to_string(),
            IndexRecord {
                checksum: Self::checksum(ddl),
                source_file,
                applied_at: now.clone(),
                triggers,
            },
        );
        self.updated_at = now;
    }

    /// Forgets `table`. Returns the removed record.
    pub fn remove(&mut self, table: &str) -> Option<IndexRecord> {
        let removed = self.indexes.remove(table);
        if removed.is_some() {
            self.updated_at = now_rfc3339();
        }
        removed
    }

    /// Classifies the compiled `ddl` of `table` against the recorded checksum.
    pub fn state_of(&self, table: &str, ddl: &str) -> IndexState {
        match self.indexes.get(table) {
            None => IndexState::New,
            Some(record) if record.checksum == Self::checksum(ddl) => IndexState::Current,
            Some(_) => IndexState::Changed,
        }
    }

    /// Returns the differences from `self` to `newer`.
    pub fn diff(&self, newer: &Manifest) -> ManifestDiff {
        let mut diff = ManifestDiff::default();
        for (name, record) in &self.indexes {
            match newer.indexes.get(name) {
                None => diff.removed.push(name.clone()),
                Some(other) if other.checksum != record.checksum => diff.changed.push(name.clone()),
                Some(_) => {}
            }
        }
        diff.added = newer
            .indexes
            .keys()
            .filter(|name| !self.indexes.contains_key(*name))
            .cloned()
            .collect();
        diff
    }

    /// Looks up the record of an index.
    pub fn get(&self, table: &str) -> Option<&IndexRecord> {
        self.indexes.get(table)
    }

    /// Returns `true` if the manifest has a record for `table`.
    pub fn contains(&self, table: &str) -> bool {
        self.indexes.contains_key(table)
    }
}

/// Current UTC time as an RFC 3339 string with second precision.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDL_A: &str = r#"CREATE VIRTUAL TABLE "a" USING fts5(x, tokenize='unicode61');"#;
    const DDL_B: &str = r#"CREATE VIRTUAL TABLE "a" USING fts5(x, tokenize='porter');"#;

    #[test]
    fn test_manifest_creation() {
        let m = Manifest::new("0.1.0".into());
        assert_eq!(m.version, MANIFEST_VERSION);
        assert!(m.indexes.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&m.updated_at).is_ok());
    }

    #[test]
    fn test_state_of() {
        let mut m = Manifest::new("0.1.0".into());
        assert_eq!(m.state_of("a", DDL_A), IndexState::New);
        m.record("a", DDL_A, None, false);
        assert_eq!(m.state_of("a", DDL_A), IndexState::Current);
        assert_eq!(m.state_of("a", DDL_B), IndexState::Changed);
    }

    #[test]
    fn test_diff() {
        let mut old = Manifest::new("0.1.0".into());
        old.record("a", DDL_A, None, false);
        old.record("gone", DDL_A, None, false);
        old.record("same", DDL_A, None, false);

        let mut new = Manifest::new("0.1.0".into());
        new.record("a", DDL_B, None, false);
        new.record("same", DDL_A, None, true);
        new.record("fresh", DDL_A, None, false);

        let diff = old.diff(&new);
        assert_eq!(diff.added, vec!["fresh"]);
        assert_eq!(diff.removed, vec!["gone"]);
        assert_eq!(diff.changed, vec!["a"]);
        assert!(!diff.is_empty());
        assert!(new.diff(&new).is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        let mut m = Manifest::new("0.1.0".into());
        m.record("a", DDL_A, Some("a.yaml".into()), true);
        m.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded, m);
        assert_eq!(loaded.get("a").unwrap().source_file.as_deref(), Some("a.yaml"));
    }

    #[test]
    fn test_load_rejects_malformed_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"{"version": "1.0", "tool_version": "0.1.0", "updated_at": "2024-01-01T00:00:00Z",
                "indexes": {"a": {"checksum": "xyz", "applied_at": "2024-01-01T00:00:00Z"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            Manifest::load(&path),
            Err(DatabaseError::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_load_or_new_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = Manifest::load_or_new(dir.path().join("missing.json"), "0.2.0").unwrap();
        assert_eq!(m.tool_version, "0.2.0");

        m.record("a", DDL_A, None, false);
        assert!(m.remove("a").is_some());
        assert!(m.remove("a").is_none());
        assert!(!m.contains("a"));
    }
}

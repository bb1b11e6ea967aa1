//! High-level management of FTS5 indexes.
//!
//! [`FtsIndexManager`] drives the compilers of `fts-schema-core` against an
//! [`SqlExecutor`]: it creates indexes (with their synchronization triggers
//! and backfill), reads their definitions back from `sqlite_master`, runs
//! ranked searches, and issues maintenance commands.
//!
//! # Example
//!
//! ```
//! use fts_schema_core::{SearchRequest, TableDefinition};
//! use fts_schema_sqlite::{CreateOptions, FtsIndexManager, SqlExecutor, SqliteExecutor};
//!
//! let executor = SqliteExecutor::open_in_memory().unwrap();
//! executor
//!     .execute_batch("CREATE TABLE notes (body TEXT); INSERT INTO notes VALUES ('hello world');")
//!     .unwrap();
//!
//! let manager = FtsIndexManager::new(executor);
//! let def = TableDefinition::new("notes_fts", ["body"]).with_content("notes", None);
//! let report = manager.create(&def, CreateOptions::default()).unwrap();
//! assert_eq!(report.populated_rows, 1);
//!
//! let page = manager.search("notes_fts", &SearchRequest::new("hello")).unwrap();
//! assert_eq!(page.total, 1);
//! assert_eq!(page.results[0].row["body"], "hello world");
//! ```

use fts_schema_core::{
    MaintenanceCommand, PartialTableDefinition, SearchRequest, SearchResult, TableDefinition,
    TriggerSource, check_columns, compile_count, compile_search, compile_table_definition,
    decompile_table_definition, drop_table_statement, drop_trigger_statements,
    populate_from_definition, quote_identifier, quote_literal, synthesize_triggers,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::convert::{take_f64, take_string};
use crate::error::{Result, SqliteError};
use crate::executor::{ExecutionMeta, SqlExecutor};

/// Options for [`FtsIndexManager::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreateOptions {
    /// Create `_ai`/`_ad`/`_au` triggers on the content table.
    pub create_triggers: bool,
    /// Backfill the index from existing content rows.
    pub populate: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            create_triggers: true,
            populate: true,
        }
    }
}

/// Outcome of [`FtsIndexManager::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateReport {
    /// Index name.
    pub table: String,
    /// Executed `CREATE VIRTUAL TABLE` statement.
    pub ddl: String,
    /// Names of the triggers created.
    pub triggers: Vec<String>,
    /// Rows copied by the backfill statement.
    pub populated_rows: u64,
}

/// One page of ranked search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    /// Matches on this page, best first.
    pub results: Vec<SearchResult>,
    /// Total matches across all pages.
    pub total: u64,
}

/// Creates, inspects, searches, and maintains FTS5 indexes.
pub struct FtsIndexManager<E> {
    executor: E,
}

impl<E: SqlExecutor> FtsIndexManager<E> {
    /// Creates a manager over `executor`.
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Borrows the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the executor.
    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Creates the index described by `def`.
    ///
    /// The `CREATE VIRTUAL TABLE` statement, the synchronization triggers,
    /// and the backfill run in a single transaction. Triggers and backfill
    /// apply only to external-content definitions.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::ConfigError`] for an invalid definition
    /// (nothing is executed), or [`SqliteError::SqlError`] if any
    /// statement fails (nothing is committed).
    pub fn create(&self, def: &TableDefinition, options: CreateOptions) -> Result<CreateReport> {
        let report = self.install(def, options, Vec::new())?;
        info!(
            table = %def.table_name,
            triggers = report.triggers.len(),
            populated_rows = report.populated_rows,
            "Created FTS5 index"
        );
        Ok(report)
    }

    /// Replaces an existing index with the one described by `def`.
    ///
    /// The old triggers and table are dropped in the same transaction that
    /// creates the new index, so a failed rebuild leaves the old index in
    /// place.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    pub fn recreate(&self, def: &TableDefinition, options: CreateOptions) -> Result<CreateReport> {
        let mut drops = drop_trigger_statements(&def.table_name);
        drops.push(drop_table_statement(&def.table_name));
        let report = self.install(def, options, drops)?;
        info!(
            table = %def.table_name,
            triggers = report.triggers.len(),
            populated_rows = report.populated_rows,
            "Recreated FTS5 index"
        );
        Ok(report)
    }

    /// Compiles `def` and runs it after `statements` in one transaction.
    fn install(
        &self,
        def: &TableDefinition,
        options: CreateOptions,
        mut statements: Vec<String>,
    ) -> Result<CreateReport> {
        let ddl = compile_table_definition(def)?;
        statements.push(ddl.clone());
        let mut triggers = Vec::new();

        let external = def.content_table.is_some();
        if external && options.create_triggers {
            for trigger in synthesize_triggers(&TriggerSource::from_definition(def)?) {
                statements.push(trigger.sql);
                triggers.push(trigger.name);
            }
        }
        let populate = external && options.populate;
        if populate {
            statements.push(populate_from_definition(def)?);
        }

        let metas = self.executor.execute_in_transaction(&statements)?;
        let populated_rows = if populate {
            metas.last().map_or(0, |meta| meta.changes)
        } else {
            0
        };

        Ok(CreateReport {
            table: def.table_name.clone(),
            ddl,
            triggers,
            populated_rows,
        })
    }

    /// Returns the stored `CREATE` statement of `table`, if the table exists.
    pub fn stored_sql(&self, table: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = {}",
            quote_literal(table)
        );
        let mut output = self.executor.execute(&sql)?;
        Ok(output
            .rows
            .first_mut()
            .and_then(|row| take_string(row, "sql")))
    }

    /// Reads back the definition of an existing index.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::IndexNotFound`] if no such table exists, or
    /// [`SqliteError::NotAnFtsTable`] if it is not an FTS5 table.
    pub fn load_definition(&self, table: &str) -> Result<PartialTableDefinition> {
        let sql = self
            .stored_sql(table)?
            .ok_or_else(|| SqliteError::IndexNotFound(table.to_string()))?;
        match decompile_table_definition(sql.as_str()) {
            Some(partial) => Ok(partial),
            None => {
                warn!(table = %table, "Stored SQL is not an FTS5 definition");
                Err(SqliteError::NotAnFtsTable(table.to_string()))
            }
        }
    }

    /// Lists the names of all FTS5 indexes, sorted.
    pub fn list_indexes(&self) -> Result<Vec<String>> {
        let output = self.executor.execute(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND lower(sql) LIKE '%using fts5%' ORDER BY name",
        )?;
        Ok(output
            .rows
            .into_iter()
            .filter_map(|mut row| take_string(&mut row, "name"))
            .collect())
    }

    /// Counts the rows of `table`.
    pub fn count_rows(&self, table: &str) -> Result<u64> {
        let output = self.executor.execute(&format!(
            "SELECT COUNT(*) AS total FROM {}",
            quote_identifier(table)
        ))?;
        read_total(output.rows)
    }

    /// Runs a ranked search and its companion count query.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::SearchError`] for a rejected request, notably
    /// [`SearchError::EmptyQuery`](fts_schema_core::SearchError::EmptyQuery)
    /// when nothing is left of the query text after sanitization, or when a
    /// filter column is not a column of the index.
    pub fn search(&self, table: &str, request: &SearchRequest) -> Result<SearchPage> {
        let compiled = compile_search(table, request)?;
        if request.columns.is_some()
            && let Some(columns) = self.load_definition(table)?.columns
        {
            check_columns(request, &columns)?;
        }

        let output = self.executor.execute(&compiled.query)?;
        let results = output
            .rows
            .into_iter()
            .map(|mut row| {
                let rank = take_f64(&mut row, "rank")?;
                let snippet = if compiled.include_snippet {
                    take_string(&mut row, "snippet")
                } else {
                    None
                };
                Ok(SearchResult { row, rank, snippet })
            })
            .collect::<Result<Vec<_>>>()?;

        let total = read_total(self.executor.execute(&compile_count(table, request)?)?.rows)?;
        debug!(table = %table, hits = results.len(), total, "Search completed");

        Ok(SearchPage { results, total })
    }

    /// Runs a maintenance command against an existing index.
    ///
    /// # Errors
    ///
    /// Fails if `table` is not an FTS5 index, or with
    /// [`SqliteError::SqlError`] if the command fails (for
    /// `integrity-check`, when the index is inconsistent).
    pub fn maintain(&self, table: &str, command: MaintenanceCommand) -> Result<ExecutionMeta> {
        self.load_definition(table)?;
        let output = self.executor.execute(&command.to_sql(table))?;
        info!(table = %table, command = %command, "Ran maintenance command");
        Ok(output.meta)
    }

    /// Drops an index, optionally with its synchronization triggers.
    pub fn drop_index(&self, table: &str, drop_triggers: bool) -> Result<()> {
        let mut statements = Vec::new();
        if drop_triggers {
            statements.extend(drop_trigger_statements(table));
        }
        statements.push(drop_table_statement(table));
        self.executor.execute_in_transaction(&statements)?;
        info!(table = %table, drop_triggers, "Dropped FTS5 index");
        Ok(())
    }
}

fn read_total(rows: Vec<crate::convert::Row>) -> Result<u64> {
    rows.first()
        .and_then(|row| row.get("total"))
        .and_then(|v| v.as_u64())
        .ok_or_else(|| SqliteError::ConversionError("count query returned no total".to_string()))
}

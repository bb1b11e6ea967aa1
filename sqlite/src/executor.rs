//! SQL execution collaborator.
//!
//! The engine in `fts-schema-core` only produces SQL text. [`SqlExecutor`]
//! is the seam through which that text reaches a database, and
//! [`SqliteExecutor`] is its implementation over a `rusqlite` connection.
//!
//! # Example
//!
//! ```
//! use fts_schema_sqlite::{SqlExecutor, SqliteExecutor};
//!
//! let executor = SqliteExecutor::open_in_memory().unwrap();
//! executor.execute_batch("CREATE TABLE t (a TEXT); INSERT INTO t VALUES ('x');").unwrap();
//!
//! let output = executor.execute("SELECT a FROM t").unwrap();
//! assert_eq!(output.rows[0]["a"], "x");
//! ```

use std::path::Path;
use std::time::Instant;

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::convert::{Row, read_row};
use crate::error::{Result, SqliteError};

/// Metadata about one executed statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExecutionMeta {
    /// Rows inserted, updated, or deleted by the statement.
    pub changes: u64,
    /// Rowid of the most recent successful insert on the connection.
    pub last_insert_rowid: i64,
    /// Wall-clock execution time in milliseconds.
    pub elapsed_ms: f64,
}

/// Rows and metadata produced by one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOutput {
    /// Result rows keyed by column name, in result order.
    pub rows: Vec<Row>,
    /// Execution metadata.
    pub meta: ExecutionMeta,
}

/// Executes SQL text against a database.
pub trait SqlExecutor {
    /// Executes a single statement and collects its result rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::SqlError`] if the engine rejects the statement.
    fn execute(&self, sql: &str) -> Result<QueryOutput>;

    /// Executes several `;`-separated statements, discarding any rows.
    fn execute_batch(&self, sql: &str) -> Result<()>;

    /// Executes `statements` in order inside one transaction.
    ///
    /// Either every statement takes effect or none does. Returns the
    /// metadata of each statement.
    fn execute_in_transaction(&self, statements: &[String]) -> Result<Vec<ExecutionMeta>>;
}

/// [`SqlExecutor`] over an owned SQLite connection.
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    /// Wraps an existing connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Connection::open(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns the underlying connection.
    pub fn into_inner(self) -> Connection {
        self.conn
    }

    fn run(conn: &Connection, sql: &str) -> Result<QueryOutput> {
        let started = Instant::now();
        let mut stmt = conn.prepare(sql).map_err(|e| SqliteError::sql(e, sql))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).map_err(|e| SqliteError::sql(e, sql))?;
        while let Some(row) = cursor.next().map_err(|e| SqliteError::sql(e, sql))? {
            rows.push(read_row(row, &columns)?);
        }

        let meta = ExecutionMeta {
            changes: conn.changes(),
            last_insert_rowid: conn.last_insert_rowid(),
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        debug!(
            rows = rows.len(),
            changes = meta.changes,
            elapsed_ms = meta.elapsed_ms,
            "Executed statement"
        );
        Ok(QueryOutput { rows, meta })
    }
}

impl SqlExecutor for SqliteExecutor {
    fn execute(&self, sql: &str) -> Result<QueryOutput> {
        Self::run(&self.conn, sql)
    }

    fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| SqliteError::sql(e, sql))
    }

    fn execute_in_transaction(&self, statements: &[String]) -> Result<Vec<ExecutionMeta>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut metas = Vec::with_capacity(statements.len());
        for sql in statements {
            metas.push(Self::run(&tx, sql)?.meta);
        }
        tx.commit()?;
        Ok(metas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> SqliteExecutor {
        let executor = SqliteExecutor::open_in_memory().unwrap();
        executor
            .execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, data BLOB);")
            .unwrap();
        executor
    }

    #[test]
    fn test_execute_reports_changes_and_rowid() {
        let ex = executor();
        let out = ex
            .execute("INSERT INTO items (name) VALUES ('a'), ('b')")
            .unwrap();
        assert!(out.rows.is_empty());
        assert_eq!(out.meta.changes, 2);
        assert_eq!(out.meta.last_insert_rowid, 2);
    }

    #[test]
    fn test_execute_returns_rows_in_order() {
        let ex = executor();
        ex.execute_batch("INSERT INTO items (name, data) VALUES ('a', x'01ff'), ('b', NULL);")
            .unwrap();
        let out = ex.execute("SELECT id, name, data FROM items ORDER BY id").unwrap();
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0]["name"], "a");
        assert_eq!(out.rows[0]["data"], "01ff");
        assert!(out.rows[1]["data"].is_null());
    }

    #[test]
    fn test_sql_error_carries_statement() {
        let ex = executor();
        let err = ex.execute("SELECT * FROM missing").unwrap_err();
        match err {
            SqliteError::SqlError { message, sql } => {
                assert!(message.contains("no such table"));
                assert_eq!(sql, "SELECT * FROM missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let ex = executor();
        let result = ex.execute_in_transaction(&[
            "INSERT INTO items (name) VALUES ('kept?')".to_string(),
            "INSERT INTO nope VALUES (1)".to_string(),
        ]);
        assert!(result.is_err());
        let out = ex.execute("SELECT COUNT(*) AS n FROM items").unwrap();
        assert_eq!(out.rows[0]["n"], 0);
    }

    #[test]
    fn test_transaction_returns_meta_per_statement() {
        let ex = executor();
        let metas = ex
            .execute_in_transaction(&[
                "INSERT INTO items (name) VALUES ('a')".to_string(),
                "UPDATE items SET name = 'b'".to_string(),
            ])
            .unwrap();
        assert_eq!(metas.len(), 2);
        assert_eq!(metas[1].changes, 1);
    }
}

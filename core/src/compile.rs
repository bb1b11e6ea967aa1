//! `CREATE VIRTUAL TABLE` generation.
//!
//! Produces the single statement that materializes an FTS5 index:
//!
//! ```text
//! CREATE VIRTUAL TABLE "name" USING fts5(col1, col2 UNINDEXED, tokenize='porter remove_diacritics 1', prefix='2 3', content='source', content_rowid='rowid');
//! ```
//!
//! The table name is always quoted. Columns are emitted bare, which
//! validation guarantees is safe. Option values go through
//! [`quote_literal`].

use crate::error::ConfigError;
use crate::quote::{quote_identifier, quote_literal};
use crate::tokenizer::encode_tokenizer;
use crate::validate::validate_definition;
use crate::TableDefinition;

/// Validates `def` and compiles it into a `CREATE VIRTUAL TABLE` statement.
///
/// # Errors
///
/// Returns the first [`ConfigError`] reported by
/// [`validate_definition`]; no SQL is produced in that case.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{TableDefinition, compile_table_definition};
///
/// let def = TableDefinition::new("articles_fts", ["title", "body"]);
/// assert_eq!(
///     compile_table_definition(&def).unwrap(),
///     r#"CREATE VIRTUAL TABLE "articles_fts" USING fts5(title, body, tokenize='unicode61');"#,
/// );
/// ```
pub fn compile_table_definition(def: &TableDefinition) -> Result<String, ConfigError> {
    validate_definition(def)?;
    Ok(render_create_statement(def))
}

fn render_create_statement(def: &TableDefinition) -> String {
    let mut args: Vec<String> = def
        .columns
        .iter()
        .map(|column| {
            if def.is_unindexed(column) {
                format!("{column} UNINDEXED")
            } else {
                column.clone()
            }
        })
        .collect();

    args.push(format!(
        "tokenize={}",
        quote_literal(&encode_tokenizer(&def.tokenizer))
    ));

    if let Some(lengths) = def.prefix_lengths() {
        let joined = lengths
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        args.push(format!("prefix={}", quote_literal(&joined)));
    }

    if let Some(content) = &def.content_table {
        args.push(format!("content={}", quote_literal(content)));
        if let Some(row_id) = &def.content_row_id {
            args.push(format!("content_rowid={}", quote_literal(row_id)));
        }
    }

    format!(
        "CREATE VIRTUAL TABLE {} USING fts5({});",
        quote_identifier(&def.table_name),
        args.join(", ")
    )
}

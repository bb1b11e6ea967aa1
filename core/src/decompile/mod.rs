//! Recovery of table definitions from stored `CREATE VIRTUAL TABLE` SQL.
//!
//! Decompilation is best-effort. The statement is tokenized and parsed into
//! a typed AST ([`VirtualTableAst`]); each field of the resulting
//! [`PartialTableDefinition`] is filled only when its part of the AST was
//! recovered. Nothing here returns an error: a field that cannot be read is
//! simply `None`.
//!
//! # Examples
//!
//! ```
//! use fts_schema_core::*;
//!
//! let sql = r#"CREATE VIRTUAL TABLE "articles_fts" USING fts5(title, body, tokenize='unicode61');"#;
//! let partial = decompile_table_definition(sql).unwrap();
//! assert_eq!(partial.table_name.as_deref(), Some("articles_fts"));
//! assert_eq!(partial.columns, Some(vec!["title".to_string(), "body".to_string()]));
//! assert_eq!(partial.tokenizer, Some(TokenizerConfig::new(TokenizerType::Unicode61)));
//! assert!(partial.unindexed.is_none());
//!
//! assert!(decompile_table_definition("CREATE TABLE plain (a TEXT)").is_none());
//! assert!(decompile_table_definition(None::<&str>).is_none());
//! ```

mod lexer;
mod parser;

pub use parser::{ModuleArg, ParseError, TableHeader, VirtualTableAst, parse_virtual_table};

use tracing::debug;

use crate::tokenizer::decode_tokenizer;
use crate::{PartialTableDefinition, PrefixIndexConfig};

/// Decompiles stored `CREATE VIRTUAL TABLE` text.
///
/// Returns `None` when `sql` is absent or does not describe an FTS5 table
/// (no case-insensitive `using fts5`). Otherwise returns whatever could be
/// recovered; prefix lengths that are not integers are discarded, multiple
/// `prefix=` options accumulate, and unknown options are ignored.
pub fn decompile_table_definition<'a>(
    sql: impl Into<Option<&'a str>>,
) -> Option<PartialTableDefinition> {
    let sql = sql.into()?;
    if !sql.to_ascii_lowercase().contains("using fts5") {
        return None;
    }

    let ast = parse_virtual_table(sql);
    let mut partial = PartialTableDefinition::default();

    match ast.header {
        Ok(header) => partial.table_name = Some(header.name),
        Err(err) => debug!(error = %err, "Could not recover table name"),
    }

    let args = match ast.args {
        Ok(args) => args,
        Err(err) => {
            debug!(error = %err, "Could not recover module arguments");
            return Some(partial);
        }
    };

    let mut columns = Vec::new();
    let mut unindexed = Vec::new();
    let mut prefix_lengths = Vec::new();

    for arg in args {
        match arg {
            ModuleArg::Column {
                name,
                unindexed: is_unindexed,
            } => {
                if is_unindexed {
                    unindexed.push(name.clone());
                }
                columns.push(name);
            }
            ModuleArg::Option { key, value } => match key.to_ascii_lowercase().as_str() {
                "tokenize" => partial.tokenizer = Some(decode_tokenizer(&value)),
                "prefix" => prefix_lengths.extend(parse_prefix_lengths(&value)),
                "content" => partial.content_table = Some(value),
                "content_rowid" => partial.content_row_id = Some(value),
                _ => debug!(key = %key, "Ignoring unrecognized fts5 option"),
            },
        }
    }

    if !columns.is_empty() {
        partial.columns = Some(columns);
    }
    if !unindexed.is_empty() {
        partial.unindexed = Some(unindexed);
    }
    if !prefix_lengths.is_empty() {
        partial.prefix_index = Some(PrefixIndexConfig::with_lengths(prefix_lengths));
    }

    Some(partial)
}

fn parse_prefix_lengths(value: &str) -> Vec<u32> {
    value
        .split_whitespace()
        .filter_map(|token| token.parse::<u32>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TokenizerConfig, TokenizerType};

    #[test]
    fn test_full_statement() {
        let sql = "CREATE VIRTUAL TABLE \"name\" USING fts5(col1, col2 UNINDEXED, \
                   tokenize='porter remove_diacritics 1', prefix='2 3', \
                   content='source', content_rowid='rowid');";
        let partial = decompile_table_definition(sql).unwrap();
        assert_eq!(partial.table_name.as_deref(), Some("name"));
        assert_eq!(partial.columns, Some(vec!["col1".into(), "col2".into()]));
        assert_eq!(partial.unindexed, Some(vec!["col2".into()]));
        assert_eq!(
            partial.tokenizer,
            Some(TokenizerConfig::new(TokenizerType::Porter).with_remove_diacritics(1))
        );
        assert_eq!(
            partial.prefix_index,
            Some(PrefixIndexConfig::with_lengths([2, 3]))
        );
        assert_eq!(partial.content_table.as_deref(), Some("source"));
        assert_eq!(partial.content_row_id.as_deref(), Some("rowid"));
    }

    #[test]
    fn test_not_fts5() {
        assert!(
            decompile_table_definition("CREATE VIRTUAL TABLE t USING rtree(id, a, b)").is_none()
        );
        assert!(decompile_table_definition("").is_none());
    }

    #[test]
    fn test_lowercase_and_if_not_exists() {
        let partial = decompile_table_definition(
            "create virtual table if not exists notes using fts5(body unindexed, title)",
        )
        .unwrap();
        assert_eq!(partial.table_name.as_deref(), Some("notes"));
        assert_eq!(partial.unindexed, Some(vec!["body".into()]));
        assert!(partial.tokenizer.is_none());
    }

    #[test]
    fn test_bad_prefix_tokens_are_discarded() {
        let partial = decompile_table_definition(
            "CREATE VIRTUAL TABLE t USING fts5(a, prefix='2 x 4')",
        )
        .unwrap();
        assert_eq!(partial.prefix_index.unwrap().lengths, vec![2, 4]);

        let partial =
            decompile_table_definition("CREATE VIRTUAL TABLE t USING fts5(a, prefix='x')")
                .unwrap();
        assert!(partial.prefix_index.is_none());
    }

    #[test]
    fn test_repeated_prefix_options_accumulate() {
        let partial = decompile_table_definition(
            "CREATE VIRTUAL TABLE t USING fts5(a, prefix=2, prefix=3)",
        )
        .unwrap();
        assert_eq!(partial.prefix_index.unwrap().lengths, vec![2, 3]);
    }

    #[test]
    fn test_quoted_commas_do_not_split_arguments() {
        let partial = decompile_table_definition(
            "CREATE VIRTUAL TABLE t USING fts5(a, b, tokenize='unicode61 separators '', ;''')",
        )
        .unwrap();
        assert_eq!(partial.columns, Some(vec!["a".into(), "b".into()]));
        let params = partial.tokenizer.unwrap().parameters.unwrap();
        assert_eq!(params.separators.as_deref(), Some(", ;"));
    }

    #[test]
    fn test_garbled_header_keeps_columns() {
        let partial =
            decompile_table_definition("CREATE VIRTUAL \"t\" USING fts5(a, b)").unwrap();
        assert!(partial.table_name.is_none());
        assert_eq!(partial.columns, Some(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_missing_argument_list_yields_name_only() {
        let partial = decompile_table_definition("CREATE VIRTUAL TABLE t USING fts5").unwrap();
        assert_eq!(partial.table_name.as_deref(), Some("t"));
        assert!(partial.columns.is_none());
    }

    #[test]
    fn test_stored_sql_with_comments() {
        let sql = "CREATE VIRTUAL TABLE docs USING fts5(\n  -- searchable text\n  body,\n  /* id */ ref UNINDEXED\n)";
        let partial = decompile_table_definition(sql).unwrap();
        assert_eq!(partial.columns, Some(vec!["body".into(), "ref".into()]));
        assert_eq!(partial.unindexed, Some(vec!["ref".into()]));
    }
}

//! One-shot backfill of a newly created index.

use crate::TableDefinition;
use crate::error::ConfigError;
use crate::quote::{column_identifier, quote_identifier};
use crate::validate::validate_definition;

/// Builds the `INSERT INTO ... SELECT ...` statement that copies existing
/// rows of `source` into `fts`.
///
/// Column names that are not bare identifiers are quoted. With
/// `carry_rowid`, the source `rowid` becomes the index row identity so
/// that later trigger-issued deletes address the right entries.
///
/// # Examples
///
/// ```
/// use fts_schema_core::build_populate_query;
///
/// let cols = ["title".to_string(), "body".to_string()];
/// assert_eq!(
///     build_populate_query("articles_fts", "articles", &cols, true),
///     r#"INSERT INTO "articles_fts" (rowid, title, body) SELECT rowid, title, body FROM "articles";"#,
/// );
/// assert_eq!(
///     build_populate_query("articles_fts", "articles", &cols, false),
///     r#"INSERT INTO "articles_fts" (title, body) SELECT title, body FROM "articles";"#,
/// );
/// ```
pub fn build_populate_query(
    fts: &str,
    source: &str,
    columns: &[String],
    carry_rowid: bool,
) -> String {
    build_query(fts, source, columns, carry_rowid.then_some("rowid"))
}

/// Builds the backfill statement for an external-content definition.
///
/// The identity column is `contentRowId` when set, `rowid` otherwise.
///
/// # Errors
///
/// Returns the definition's validation error, or
/// [`ConfigError::MissingContentTable`] when there is nothing to copy from.
pub fn populate_from_definition(def: &TableDefinition) -> Result<String, ConfigError> {
    validate_definition(def)?;
    let source = def
        .content_table
        .as_deref()
        .ok_or_else(|| ConfigError::MissingContentTable(def.table_name.clone()))?;
    let row_id = def.content_row_id.as_deref().unwrap_or("rowid");
    Ok(build_query(&def.table_name, source, &def.columns, Some(row_id)))
}

fn build_query(fts: &str, source: &str, columns: &[String], row_id: Option<&str>) -> String {
    let cols = columns
        .iter()
        .map(|c| column_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    match row_id {
        Some(id) => format!(
            "INSERT INTO {} (rowid, {cols}) SELECT {}, {cols} FROM {};",
            quote_identifier(fts),
            column_identifier(id),
            quote_identifier(source)
        ),
        None => format!(
            "INSERT INTO {} ({cols}) SELECT {cols} FROM {};",
            quote_identifier(fts),
            quote_identifier(source)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_from_definition_uses_content_rowid() {
        let def = TableDefinition::new("docs_fts", ["body"]).with_content("docs", Some("doc_id"));
        assert_eq!(
            populate_from_definition(&def).unwrap(),
            "INSERT INTO \"docs_fts\" (rowid, body) SELECT doc_id, body FROM \"docs\";"
        );
    }

    #[test]
    fn test_populate_from_definition_defaults_to_rowid() {
        let def = TableDefinition::new("docs_fts", ["body"]).with_content("docs", None);
        assert!(populate_from_definition(&def)
            .unwrap()
            .contains("SELECT rowid, body FROM"));
    }

    #[test]
    fn test_populate_requires_content_table() {
        let def = TableDefinition::new("docs_fts", ["body"]);
        assert_eq!(
            populate_from_definition(&def),
            Err(ConfigError::MissingContentTable("docs_fts".into()))
        );
    }

    #[test]
    fn test_identifiers_are_quoted() {
        let sql = build_populate_query("a\"b", "src", &["x".to_string()], false);
        assert_eq!(sql, "INSERT INTO \"a\"\"b\" (x) SELECT x FROM \"src\";");
    }

    #[test]
    fn test_non_bare_columns_are_quoted() {
        let cols = ["body".to_string(), "x) SELECT 1; --".to_string()];
        assert_eq!(
            build_populate_query("fts", "src", &cols, true),
            "INSERT INTO \"fts\" (rowid, body, \"x) SELECT 1; --\") \
             SELECT rowid, body, \"x) SELECT 1; --\" FROM \"src\";"
        );
    }
}

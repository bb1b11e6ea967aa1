//! Synchronization triggers for external-content indexes.
//!
//! An FTS5 table declared with `content='source'` stores only the index; the
//! rows live in `source`. Three triggers on the source table keep the two
//! consistent:
//!
//! | Suffix | Event  | Effect |
//! |--------|--------|--------|
//! | `_ai`  | INSERT | index the new row image |
//! | `_ad`  | DELETE | issue the FTS5 `'delete'` command with the old row image |
//! | `_au`  | UPDATE | `'delete'` the old image, then index the new one |
//!
//! Every statement lists the columns in definition order; FTS5 matches
//! values to columns by position.

use crate::error::ConfigError;
use crate::quote::{column_identifier, quote_identifier};
use crate::validate::validate_definition;
use crate::{TableDefinition, TriggerEvent, TriggerSpec};

/// Input to [`synthesize_triggers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSource {
    /// Table holding the rows.
    pub source_table: String,
    /// External-content FTS5 table.
    pub fts_table: String,
    /// Indexed columns, in the FTS5 table's declaration order.
    pub columns: Vec<String>,
    /// Source column carrying row identity; `rowid` when unset.
    pub content_rowid: Option<String>,
}

impl TriggerSource {
    /// Creates a source keyed by `rowid`.
    ///
    /// Column names are not validated; those that are not bare identifiers
    /// are quoted in the generated triggers.
    pub fn new<I, S>(source_table: &str, fts_table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source_table: source_table.to_string(),
            fts_table: fts_table.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
            content_rowid: None,
        }
    }

    /// Builds a trigger source from a validated external-content definition.
    ///
    /// # Errors
    ///
    /// Returns the definition's validation error, or
    /// [`ConfigError::MissingContentTable`] if it has no content table.
    pub fn from_definition(def: &TableDefinition) -> Result<Self, ConfigError> {
        validate_definition(def)?;
        let source_table = def
            .content_table
            .as_deref()
            .ok_or_else(|| ConfigError::MissingContentTable(def.table_name.clone()))?;
        Ok(Self {
            source_table: source_table.to_string(),
            fts_table: def.table_name.clone(),
            columns: def.columns.clone(),
            content_rowid: def.content_row_id.clone(),
        })
    }

    fn row_id(&self) -> String {
        column_identifier(self.content_rowid.as_deref().unwrap_or("rowid"))
    }

    fn trigger_name(&self, event: TriggerEvent) -> String {
        format!("{}{}", self.fts_table, event.suffix())
    }

    fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| column_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn row_values(&self, image: &str) -> String {
        std::iter::once(self.row_id())
            .chain(self.columns.iter().map(|c| column_identifier(c)))
            .map(|c| format!("{image}.{c}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn insert_row(&self, image: &str) -> String {
        format!(
            "INSERT INTO {}(rowid, {}) VALUES ({});",
            quote_identifier(&self.fts_table),
            self.column_list(),
            self.row_values(image),
        )
    }

    fn delete_row(&self, image: &str) -> String {
        let fts = quote_identifier(&self.fts_table);
        format!(
            "INSERT INTO {fts}({fts}, rowid, {}) VALUES('delete', {});",
            self.column_list(),
            self.row_values(image),
        )
    }
}

/// Generates the `_ai`, `_ad` and `_au` triggers, in that order.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{TriggerEvent, TriggerSource, synthesize_triggers};
///
/// let triggers = synthesize_triggers(&TriggerSource::new("docs", "docs_fts", ["title"]));
/// assert_eq!(triggers.len(), 3);
/// assert_eq!(triggers[0].name, "docs_fts_ai");
/// assert_eq!(triggers[0].event, TriggerEvent::Insert);
/// assert_eq!(
///     triggers[0].sql,
///     r#"CREATE TRIGGER "docs_fts_ai" AFTER INSERT ON "docs" BEGIN INSERT INTO "docs_fts"(rowid, title) VALUES (new.rowid, new.title); END;"#,
/// );
/// ```
pub fn synthesize_triggers(source: &TriggerSource) -> Vec<TriggerSpec> {
    [
        (TriggerEvent::Insert, source.insert_row("new")),
        (TriggerEvent::Delete, source.delete_row("old")),
        (
            TriggerEvent::Update,
            format!("{} {}", source.delete_row("old"), source.insert_row("new")),
        ),
    ]
    .into_iter()
    .map(|(event, body)| {
        let name = source.trigger_name(event);
        let sql = format!(
            "CREATE TRIGGER {} AFTER {} ON {} BEGIN {body} END;",
            quote_identifier(&name),
            event.as_str(),
            quote_identifier(&source.source_table),
        );
        TriggerSpec { name, event, sql }
    })
    .collect()
}

/// `DROP TRIGGER IF EXISTS` statements for the triggers of `fts_table`.
pub fn drop_trigger_statements(fts_table: &str) -> Vec<String> {
    [TriggerEvent::Insert, TriggerEvent::Delete, TriggerEvent::Update]
        .into_iter()
        .map(|event| {
            format!(
                "DROP TRIGGER IF EXISTS {};",
                quote_identifier(&format!("{fts_table}{}", event.suffix()))
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> TriggerSource {
        TriggerSource::new("articles", "articles_fts", ["title", "body"])
    }

    #[test]
    fn test_trigger_order_and_names() {
        let triggers = synthesize_triggers(&source());
        let names: Vec<_> = triggers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["articles_fts_ai", "articles_fts_ad", "articles_fts_au"]);
        let events: Vec<_> = triggers.iter().map(|t| t.event).collect();
        assert_eq!(
            events,
            vec![TriggerEvent::Insert, TriggerEvent::Delete, TriggerEvent::Update]
        );
    }

    #[test]
    fn test_delete_trigger_uses_delete_command() {
        let triggers = synthesize_triggers(&source());
        assert_eq!(
            triggers[1].sql,
            "CREATE TRIGGER \"articles_fts_ad\" AFTER DELETE ON \"articles\" BEGIN \
             INSERT INTO \"articles_fts\"(\"articles_fts\", rowid, title, body) \
             VALUES('delete', old.rowid, old.title, old.body); END;"
        );
    }

    #[test]
    fn test_update_trigger_deletes_then_inserts() {
        let sql = &synthesize_triggers(&source())[2].sql;
        let delete = sql.find("VALUES('delete', old.rowid").unwrap();
        let insert = sql.find("VALUES (new.rowid, new.title, new.body)").unwrap();
        assert!(delete < insert);
        assert!(sql.starts_with(
            "CREATE TRIGGER \"articles_fts_au\" AFTER UPDATE ON \"articles\" BEGIN "
        ));
        assert!(sql.ends_with(" END;"));
    }

    #[test]
    fn test_content_rowid_replaces_rowid_image() {
        let mut src = source();
        src.content_rowid = Some("id".into());
        let triggers = synthesize_triggers(&src);
        assert!(triggers[0].sql.contains("VALUES (new.id, new.title, new.body)"));
        assert!(triggers[1].sql.contains("VALUES('delete', old.id, old.title, old.body)"));
    }

    #[test]
    fn test_from_definition() {
        let def = TableDefinition::new("articles_fts", ["title", "body"])
            .with_content("articles", Some("id"));
        let src = TriggerSource::from_definition(&def).unwrap();
        assert_eq!(src.source_table, "articles");
        assert_eq!(src.content_rowid.as_deref(), Some("id"));
        assert_eq!(src.columns, vec!["title", "body"]);
    }

    #[test]
    fn test_from_definition_requires_content_table() {
        let def = TableDefinition::new("articles_fts", ["title"]);
        assert_eq!(
            TriggerSource::from_definition(&def),
            Err(ConfigError::MissingContentTable("articles_fts".into()))
        );
    }

    #[test]
    fn test_non_bare_columns_are_quoted() {
        let mut src = TriggerSource::new("docs", "docs_fts", ["body", "x); DROP TABLE docs; --"]);
        src.content_rowid = Some("doc id".into());
        let sql = &synthesize_triggers(&src)[0].sql;
        assert_eq!(
            sql,
            "CREATE TRIGGER \"docs_fts_ai\" AFTER INSERT ON \"docs\" BEGIN \
             INSERT INTO \"docs_fts\"(rowid, body, \"x); DROP TABLE docs; --\") \
             VALUES (new.\"doc id\", new.body, new.\"x); DROP TABLE docs; --\"); END;"
        );
    }

    #[test]
    fn test_drop_trigger_statements() {
        assert_eq!(
            drop_trigger_statements("t"),
            vec![
                "DROP TRIGGER IF EXISTS \"t_ai\";",
                "DROP TRIGGER IF EXISTS \"t_ad\";",
                "DROP TRIGGER IF EXISTS \"t_au\";",
            ]
        );
    }
}

//! FTS5 special-command statements.
//!
//! FTS5 exposes maintenance operations as `INSERT`s into a hidden column
//! named after the table itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::quote::{quote_identifier, quote_literal};

/// An index maintenance operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceCommand {
    /// Rebuild the full index from the content table.
    Rebuild,
    /// Merge all index b-trees into one.
    Optimize,
    /// Verify the index against the content table.
    IntegrityCheck,
    /// Remove every entry (contentless and external-content tables only).
    DeleteAll,
    /// Perform up to `N` pages of incremental merge work.
    Merge(i64),
    /// Set the automerge threshold (0 disables, max 16).
    Automerge(u8),
}

impl MaintenanceCommand {
    /// FTS5 command name.
    pub fn name(self) -> &'static str {
        match self {
            MaintenanceCommand::Rebuild => "rebuild",
            MaintenanceCommand::Optimize => "optimize",
            MaintenanceCommand::IntegrityCheck => "integrity-check",
            MaintenanceCommand::DeleteAll => "delete-all",
            MaintenanceCommand::Merge(_) => "merge",
            MaintenanceCommand::Automerge(_) => "automerge",
        }
    }

    /// Renders the command against `table`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fts_schema_core::MaintenanceCommand;
    ///
    /// assert_eq!(
    ///     MaintenanceCommand::Rebuild.to_sql("name"),
    ///     r#"INSERT INTO "name"("name") VALUES('rebuild');"#,
    /// );
    /// assert_eq!(
    ///     MaintenanceCommand::Merge(500).to_sql("name"),
    ///     r#"INSERT INTO "name"("name", rank) VALUES('merge', 500);"#,
    /// );
    /// ```
    pub fn to_sql(self, table: &str) -> String {
        let ident = quote_identifier(table);
        let command = quote_literal(self.name());
        match self {
            MaintenanceCommand::Merge(pages) => {
                format!("INSERT INTO {ident}({ident}, rank) VALUES({command}, {pages});")
            }
            MaintenanceCommand::Automerge(level) => {
                format!("INSERT INTO {ident}({ident}, rank) VALUES({command}, {level});")
            }
            _ => format!("INSERT INTO {ident}({ident}) VALUES({command});"),
        }
    }
}

impl fmt::Display for MaintenanceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceCommand::Merge(n) => write!(f, "merge={n}"),
            MaintenanceCommand::Automerge(n) => write!(f, "automerge={n}"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for MaintenanceCommand {
    type Err = String;

    /// Parses `rebuild`, `optimize`, `integrity-check`, `delete-all`,
    /// `merge=N` or `automerge=N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (s.trim(), None),
        };
        let bad_arg = |arg: &str| format!("invalid argument for {name}: '{arg}'");
        match (name.to_ascii_lowercase().as_str(), arg) {
            ("rebuild", None) => Ok(MaintenanceCommand::Rebuild),
            ("optimize", None) => Ok(MaintenanceCommand::Optimize),
            ("integrity-check", None) => Ok(MaintenanceCommand::IntegrityCheck),
            ("delete-all", None) => Ok(MaintenanceCommand::DeleteAll),
            ("merge", Some(arg)) => arg
                .parse()
                .map(MaintenanceCommand::Merge)
                .map_err(|_| bad_arg(arg)),
            ("automerge", Some(arg)) => match arg.parse::<u8>() {
                Ok(level) if level <= 16 => Ok(MaintenanceCommand::Automerge(level)),
                _ => Err(bad_arg(arg)),
            },
            _ => Err(format!("unknown maintenance command: '{s}'")),
        }
    }
}

/// `DROP TABLE IF EXISTS` for an index.
pub fn drop_table_statement(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {};", quote_identifier(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(
            MaintenanceCommand::Optimize.to_sql("name"),
            "INSERT INTO \"name\"(\"name\") VALUES('optimize');"
        );
        assert_eq!(
            MaintenanceCommand::IntegrityCheck.to_sql("t"),
            "INSERT INTO \"t\"(\"t\") VALUES('integrity-check');"
        );
        assert_eq!(
            MaintenanceCommand::DeleteAll.to_sql("t"),
            "INSERT INTO \"t\"(\"t\") VALUES('delete-all');"
        );
    }

    #[test]
    fn test_automerge_uses_rank_column() {
        assert_eq!(
            MaintenanceCommand::Automerge(8).to_sql("t"),
            "INSERT INTO \"t\"(\"t\", rank) VALUES('automerge', 8);"
        );
    }

    #[test]
    fn test_parse_commands() {
        let parse = |s: &str| s.parse::<MaintenanceCommand>();
        assert_eq!(parse("rebuild"), Ok(MaintenanceCommand::Rebuild));
        assert_eq!(parse("Integrity-Check"), Ok(MaintenanceCommand::IntegrityCheck));
        assert_eq!(parse("merge=-100"), Ok(MaintenanceCommand::Merge(-100)));
        assert_eq!(parse("automerge = 4"), Ok(MaintenanceCommand::Automerge(4)));
        assert!("automerge=17".parse::<MaintenanceCommand>().is_err());
        assert!("merge".parse::<MaintenanceCommand>().is_err());
        assert!("vacuum".parse::<MaintenanceCommand>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for cmd in [
            MaintenanceCommand::Rebuild,
            MaintenanceCommand::DeleteAll,
            MaintenanceCommand::Merge(64),
            MaintenanceCommand::Automerge(0),
        ] {
            assert_eq!(cmd.to_string().parse::<MaintenanceCommand>(), Ok(cmd));
        }
    }

    #[test]
    fn test_drop_table_statement() {
        assert_eq!(drop_table_statement("a\"b"), "DROP TABLE IF EXISTS \"a\"\"b\";");
    }
}

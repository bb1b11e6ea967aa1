//! Tokenizer and table definition validation.
//!
//! Validation runs before any SQL is generated. Rules are checked in a fixed
//! order and the first failure wins, so the reported error is stable for a
//! given input.
//!
//! # Examples
//!
//! ```
//! use fts_schema_core::*;
//!
//! let trigram = TokenizerConfig::new(TokenizerType::Trigram).with_case_sensitive(1);
//! assert!(validate_tokenizer(&trigram).is_ok());
//!
//! let bad = TokenizerConfig::new(TokenizerType::Porter).with_remove_diacritics(3);
//! assert_eq!(validate_tokenizer(&bad), Err(ConfigError::InvalidRemoveDiacritics(3)));
//! ```

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::quote::is_bare_identifier;
use crate::{TableDefinition, TokenizerConfig, TokenizerType};

const MAX_PREFIX_LENGTH: u32 = 999;

/// Checks a tokenizer configuration for internal consistency.
///
/// The tokenizer type itself is already guaranteed known by
/// [`TokenizerType`]; parsing a name is where an unknown type is rejected.
/// The remaining rules, in order:
///
/// 1. `remove_diacritics`, when present, is 0, 1 or 2.
/// 2. `case_sensitive`, when present, requires the `trigram` tokenizer and
///    is 0 or 1.
pub fn validate_tokenizer(config: &TokenizerConfig) -> Result<(), ConfigError> {
    let Some(params) = &config.parameters else {
        return Ok(());
    };

    if let Some(value) = params.remove_diacritics
        && value > 2
    {
        return Err(ConfigError::InvalidRemoveDiacritics(value));
    }

    if let Some(value) = params.case_sensitive {
        if config.kind != TokenizerType::Trigram {
            return Err(ConfigError::CaseSensitiveRequiresTrigram);
        }
        if value > 1 {
            return Err(ConfigError::InvalidCaseSensitive(value));
        }
    }

    Ok(())
}

/// Validates a complete table definition.
///
/// Runs [`validate_tokenizer`] first, then checks the structural
/// invariants: a non-empty table name, at least one column, unique bare
/// column identifiers, `unindexed ⊆ columns`, a content table whenever a
/// content rowid is given, and prefix lengths FTS5 will accept.
///
/// # Examples
///
/// ```
/// use fts_schema_core::*;
///
/// let def = TableDefinition::new("notes_fts", ["title", "body"]).with_unindexed("body");
/// assert!(validate_definition(&def).is_ok());
///
/// let def = TableDefinition::new("notes_fts", ["title"]).with_unindexed("body");
/// assert_eq!(
///     validate_definition(&def),
///     Err(ConfigError::UnknownUnindexedColumn("body".into())),
/// );
/// ```
pub fn validate_definition(def: &TableDefinition) -> Result<(), ConfigError> {
    validate_tokenizer(&def.tokenizer)?;

    if def.table_name.trim().is_empty() {
        return Err(ConfigError::EmptyTableName);
    }

    if def.columns.is_empty() {
        return Err(ConfigError::NoColumns);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for column in &def.columns {
        if !is_bare_identifier(column) {
            return Err(ConfigError::InvalidColumnName(column.clone()));
        }
        if !seen.insert(column.as_str()) {
            return Err(ConfigError::DuplicateColumn(column.clone()));
        }
    }

    if let Some(missing) = def.unindexed.iter().find(|c| !seen.contains(c.as_str())) {
        return Err(ConfigError::UnknownUnindexedColumn(missing.clone()));
    }

    if def.content_row_id.is_some() && def.content_table.is_none() {
        return Err(ConfigError::ContentRowIdWithoutContentTable);
    }

    for name in [&def.content_table, &def.content_row_id].into_iter().flatten() {
        if !is_bare_identifier(name) {
            return Err(ConfigError::InvalidIdentifier(name.clone()));
        }
    }

    if let Some(prefix) = &def.prefix_index
        && prefix.enabled
        && let Some(&bad) = prefix
            .lengths
            .iter()
            .find(|&&len| len == 0 || len > MAX_PREFIX_LENGTH)
    {
        return Err(ConfigError::InvalidPrefixLength(bad));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationResult;

    #[test]
    fn test_config_without_parameters_is_valid() {
        for kind in TokenizerType::ALL {
            assert!(validate_tokenizer(&TokenizerConfig::new(kind)).is_ok());
        }
    }

    #[test]
    fn test_remove_diacritics_range() {
        for value in 0..=2 {
            let cfg = TokenizerConfig::new(TokenizerType::Unicode61).with_remove_diacritics(value);
            assert!(validate_tokenizer(&cfg).is_ok());
        }
        for kind in TokenizerType::ALL {
            let cfg = TokenizerConfig::new(kind).with_remove_diacritics(3);
            assert_eq!(
                validate_tokenizer(&cfg),
                Err(ConfigError::InvalidRemoveDiacritics(3))
            );
        }
    }

    #[test]
    fn test_case_sensitive_requires_trigram() {
        let cfg = TokenizerConfig::new(TokenizerType::Unicode61).with_case_sensitive(0);
        let result = ValidationResult::from(validate_tokenizer(&cfg));
        assert!(!result.valid);
        assert_eq!(
            result.error.as_deref(),
            Some("case_sensitive is only valid for trigram tokenizer")
        );
    }

    #[test]
    fn test_case_sensitive_values_on_trigram() {
        for value in 0..=1 {
            let cfg = TokenizerConfig::new(TokenizerType::Trigram).with_case_sensitive(value);
            assert!(validate_tokenizer(&cfg).is_ok());
        }
        let cfg = TokenizerConfig::new(TokenizerType::Trigram).with_case_sensitive(2);
        assert_eq!(
            validate_tokenizer(&cfg),
            Err(ConfigError::InvalidCaseSensitive(2))
        );
    }

    #[test]
    fn test_first_failure_wins() {
        // remove_diacritics is checked before case_sensitive.
        let cfg = TokenizerConfig::new(TokenizerType::Porter)
            .with_remove_diacritics(9)
            .with_case_sensitive(1);
        assert_eq!(
            validate_tokenizer(&cfg),
            Err(ConfigError::InvalidRemoveDiacritics(9))
        );
    }

    #[test]
    fn test_definition_tokenizer_checked_first() {
        let def = TableDefinition::new("", Vec::<String>::new())
            .with_tokenizer(TokenizerConfig::new(TokenizerType::Ascii).with_case_sensitive(1));
        assert_eq!(
            validate_definition(&def),
            Err(ConfigError::CaseSensitiveRequiresTrigram)
        );
    }

    #[test]
    fn test_definition_structure() {
        assert_eq!(
            validate_definition(&TableDefinition::new("  ", ["a"])),
            Err(ConfigError::EmptyTableName)
        );
        assert_eq!(
            validate_definition(&TableDefinition::new("t", Vec::<String>::new())),
            Err(ConfigError::NoColumns)
        );
        assert_eq!(
            validate_definition(&TableDefinition::new("t", ["a", ""])),
            Err(ConfigError::InvalidColumnName(String::new()))
        );
        assert_eq!(
            validate_definition(&TableDefinition::new("t", ["a", "b", "a"])),
            Err(ConfigError::DuplicateColumn("a".into()))
        );
        assert_eq!(
            validate_definition(&TableDefinition::new("t", ["a b"])),
            Err(ConfigError::InvalidColumnName("a b".into()))
        );
    }

    #[test]
    fn test_content_rowid_requires_content_table() {
        let mut def = TableDefinition::new("t", ["a"]);
        def.content_row_id = Some("id".into());
        assert_eq!(
            validate_definition(&def),
            Err(ConfigError::ContentRowIdWithoutContentTable)
        );

        let def = TableDefinition::new("t", ["a"]).with_content("src", Some("id"));
        assert!(validate_definition(&def).is_ok());
    }

    #[test]
    fn test_content_table_must_be_identifier() {
        let def = TableDefinition::new("t", ["a"]).with_content("src'); --", None);
        assert!(matches!(
            validate_definition(&def),
            Err(ConfigError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_prefix_length_bounds() {
        let def = TableDefinition::new("t", ["a"]).with_prefix_lengths([2, 0]);
        assert_eq!(
            validate_definition(&def),
            Err(ConfigError::InvalidPrefixLength(0))
        );
        let def = TableDefinition::new("t", ["a"]).with_prefix_lengths([1000]);
        assert_eq!(
            validate_definition(&def),
            Err(ConfigError::InvalidPrefixLength(1000))
        );
        let def = TableDefinition::new("t", ["a"]).with_prefix_lengths([1, 999]);
        assert!(validate_definition(&def).is_ok());
    }
}

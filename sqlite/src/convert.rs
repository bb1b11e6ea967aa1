//! Conversion between SQLite result rows and JSON row mappings.
//!
//! SQLite's storage classes map onto JSON as follows:
//!
//! | SQLite  | JSON |
//! |---------|------|
//! | NULL    | `null` |
//! | INTEGER | number |
//! | REAL    | number (`null` for NaN/infinity) |
//! | TEXT    | string |
//! | BLOB    | lowercase hex string |

use rusqlite::types::ValueRef;
use serde_json::{Map, Number, Value};

use crate::error::{Result, SqliteError};

/// A single result row keyed by column name.
pub type Row = Map<String, Value>;

pub(crate) fn value_to_json(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(
            std::str::from_utf8(bytes)
                .map_err(|e| {
                    SqliteError::ConversionError(format!("invalid UTF-8 in text value: {e}"))
                })?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::String(to_hex(bytes)),
    })
}

pub(crate) fn read_row(row: &rusqlite::Row<'_>, columns: &[String]) -> Result<Row> {
    let mut out = Map::with_capacity(columns.len());
    for (index, name) in columns.iter().enumerate() {
        out.insert(name.clone(), value_to_json(row.get_ref(index)?)?);
    }
    Ok(out)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Reads a numeric column as `f64`.
pub(crate) fn take_f64(row: &mut Row, column: &str) -> Result<f64> {
    row.remove(column)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| SqliteError::ConversionError(format!("missing numeric column '{column}'")))
}

/// Reads an optional text column.
pub(crate) fn take_string(row: &mut Row, column: &str) -> Option<String> {
    match row.remove(column) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(value_to_json(ValueRef::Null).unwrap(), Value::Null);
        assert_eq!(value_to_json(ValueRef::Integer(-7)).unwrap(), Value::from(-7));
        assert_eq!(value_to_json(ValueRef::Real(1.5)).unwrap(), Value::from(1.5));
        assert_eq!(value_to_json(ValueRef::Real(f64::NAN)).unwrap(), Value::Null);
        assert_eq!(
            value_to_json(ValueRef::Text(b"hello")).unwrap(),
            Value::from("hello")
        );
        assert_eq!(
            value_to_json(ValueRef::Blob(&[0x00, 0xab, 0xff])).unwrap(),
            Value::from("00abff")
        );
    }

    #[test]
    fn test_invalid_utf8_is_a_conversion_error() {
        let err = value_to_json(ValueRef::Text(&[0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, SqliteError::ConversionError(_)));
    }

    #[test]
    fn test_take_helpers() {
        let mut row = Row::new();
        row.insert("rank".into(), Value::from(-1.25));
        row.insert("snippet".into(), Value::from("<mark>x</mark>"));
        row.insert("title".into(), Value::from("x"));

        assert_eq!(take_f64(&mut row, "rank").unwrap(), -1.25);
        assert_eq!(take_string(&mut row, "snippet").as_deref(), Some("<mark>x</mark>"));
        assert_eq!(row.len(), 1);
        assert!(take_f64(&mut row, "rank").is_err());
    }
}

//! # Bound Values
//!
//! [`ColumnData`] is the value type that travels next to generated SQL as a
//! positional parameter, and [`Query`] is the `(sql, data)` pair every
//! builder returns.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Column Data
// =============================================================================

/// A single bound parameter value.
///
/// ## JSON Shape
/// Untagged: `null`, `true`, `42`, `4.5` and `"text"` map to the variants in
/// declaration order, so integers never turn into floats on a round trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnData {
    /// SQL `NULL`.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ColumnData {
    /// Returns true for [`ColumnData::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnData::Null)
    }

    /// Returns the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ColumnData::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Renders the value the way it is spliced into a `LIKE` pattern.
impl fmt::Display for ColumnData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnData::Null => write!(f, "NULL"),
            ColumnData::Bool(b) => write!(f, "{b}"),
            ColumnData::Int(n) => write!(f, "{n}"),
            ColumnData::Float(x) => write!(f, "{x}"),
            ColumnData::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ColumnData {
    fn from(value: &str) -> Self {
        ColumnData::Text(value.to_string())
    }
}

impl From<String> for ColumnData {
    fn from(value: String) -> Self {
        ColumnData::Text(value)
    }
}

impl From<&String> for ColumnData {
    fn from(value: &String) -> Self {
        ColumnData::Text(value.clone())
    }
}

impl From<bool> for ColumnData {
    fn from(value: bool) -> Self {
        ColumnData::Bool(value)
    }
}

impl From<i64> for ColumnData {
    fn from(value: i64) -> Self {
        ColumnData::Int(value)
    }
}

impl From<i32> for ColumnData {
    fn from(value: i32) -> Self {
        ColumnData::Int(i64::from(value))
    }
}

impl From<u32> for ColumnData {
    fn from(value: u32) -> Self {
        ColumnData::Int(i64::from(value))
    }
}

impl From<f64> for ColumnData {
    fn from(value: f64) -> Self {
        ColumnData::Float(value)
    }
}

/// Dates are stored as ISO-8601 text (`YYYY-MM-DD`), which sorts and
/// compares correctly as a string.
impl From<NaiveDate> for ColumnData {
    fn from(value: NaiveDate) -> Self {
        ColumnData::Text(value.format("%Y-%m-%d").to_string())
    }
}

impl<T: Into<ColumnData>> From<Option<T>> for ColumnData {
    fn from(value: Option<T>) -> Self {
        value.map_or(ColumnData::Null, Into::into)
    }
}

// =============================================================================
// Query
// =============================================================================

/// Generated SQL text plus its positional parameters.
///
/// `data[i]` binds the `i`-th `?` in `sql`, counting left to right.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Query {
    pub sql: String,
    pub data: Vec<ColumnData>,
}

impl Query {
    /// The empty result produced by a where-expression with no conditions.
    pub fn empty() -> Self {
        Query::default()
    }

    /// Returns true if no SQL was produced.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Number of `?` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untagged_json_shapes() {
        let values: Vec<ColumnData> =
            serde_json::from_value(json!([null, true, 5, 2.5, "Penguin"])).unwrap();
        assert_eq!(
            values,
            vec![
                ColumnData::Null,
                ColumnData::Bool(true),
                ColumnData::Int(5),
                ColumnData::Float(2.5),
                ColumnData::Text("Penguin".to_string()),
            ]
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(ColumnData::from(None::<i64>), ColumnData::Null);
        assert_eq!(ColumnData::from(Some("x")), ColumnData::Text("x".into()));
    }

    #[test]
    fn test_date_is_iso_text() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(ColumnData::from(date), ColumnData::Text("2024-03-09".into()));
    }
}

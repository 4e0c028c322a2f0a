//! # Where-Expression Grammar
//!
//! The typed filter tree consumed by the where-clause compiler.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      WhereExpression                                    │
//! │                                                                         │
//! │   And([..]) ──┬── Simple { title: CONTAINS "Murthy" }                  │
//! │               └── Or([..]) ──┬── Simple { pages: > 100 }               │
//! │                              └── Simple { id: IN [1, 2, (SELECT ..)] } │
//! │                                                        │               │
//! │                                                        ▼               │
//! │                                    NestedQuery { table, fields, where }│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## JSON Form
//! ```json
//! { "OR": [
//!     { "title":  { "op": "CONTAINS", "value": "Murthy" } },
//!     { "isbnNo": { "op": "IN", "value": ["978", { "tableName": "t",
//!         "selectedField": ["isbnNo"], "where": {} }] } }
//! ] }
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

use super::value::ColumnData;

// =============================================================================
// Operator
// =============================================================================

/// Column comparison operator.
///
/// `In` / `NotIn` take a list value; every other operator takes a scalar, and
/// only `Equals` / `NotEquals` accept `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    GreaterThan,
    GreaterThanEquals,
    LesserThan,
    LesserThanEquals,
    In,
    NotIn,
}

impl Operator {
    /// The name used in the JSON form (`"NOT_IN"`, `"CONTAINS"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::NotEquals => "NOT_EQUALS",
            Operator::Contains => "CONTAINS",
            Operator::NotContains => "NOT_CONTAINS",
            Operator::StartsWith => "STARTS_WITH",
            Operator::NotStartsWith => "NOT_STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::NotEndsWith => "NOT_ENDS_WITH",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterThanEquals => "GREATER_THAN_EQUALS",
            Operator::LesserThan => "LESSER_THAN",
            Operator::LesserThanEquals => "LESSER_THAN_EQUALS",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
        }
    }

    /// Returns true for operators that take a list value.
    #[inline]
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Values
// =============================================================================

/// Scalar arms shared by the value visitors. `$wrap` lifts a [`ColumnData`]
/// into the visitor's output type.
macro_rules! visit_scalars {
    ($wrap:expr) => {
        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok($wrap(ColumnData::Null))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok($wrap(ColumnData::Null))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok($wrap(ColumnData::Bool(v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok($wrap(ColumnData::Int(v)))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok($wrap(match i64::try_from(v) {
                Ok(v) => ColumnData::Int(v),
                Err(_) => ColumnData::Float(v as f64),
            }))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok($wrap(ColumnData::Float(v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok($wrap(ColumnData::Text(v.to_owned())))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok($wrap(ColumnData::Text(v)))
        }
    };
}

/// The right-hand side of a leaf condition.
///
/// Deserializes from a JSON scalar, `null`, or an array of [`ListItem`]s.
/// Objects are rejected here; they are only meaningful inside a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WhereValue {
    /// Elements of an `IN` / `NOT_IN` list.
    List(Vec<ListItem>),
    /// A single value; [`ColumnData::Null`] means "is (not) null".
    Scalar(ColumnData),
}

impl WhereValue {
    /// Human-readable shape, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            WhereValue::List(_) => "list",
            WhereValue::Scalar(ColumnData::Null) => "null",
            WhereValue::Scalar(_) => "scalar",
        }
    }
}

impl From<ColumnData> for WhereValue {
    fn from(value: ColumnData) -> Self {
        WhereValue::Scalar(value)
    }
}

impl<'de> Deserialize<'de> for WhereValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WhereValueVisitor;

        impl<'de> Visitor<'de> for WhereValueVisitor {
            type Value = WhereValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a scalar, null, or a list of values and nested queries")
            }

            visit_scalars!(WhereValue::Scalar);

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element::<ListItem>()? {
                    items.push(item);
                }
                Ok(WhereValue::List(items))
            }
        }

        deserializer.deserialize_any(WhereValueVisitor)
    }
}

impl From<Vec<ListItem>> for WhereValue {
    fn from(items: Vec<ListItem>) -> Self {
        WhereValue::List(items)
    }
}

/// One element of an `IN` list: a bound value or an inlined sub-select.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListItem {
    Nested(NestedQuery),
    Value(ColumnData),
}

impl ListItem {
    /// Wraps a scalar as a list element.
    pub fn value(value: impl Into<ColumnData>) -> Self {
        ListItem::Value(value.into())
    }
}

impl From<ColumnData> for ListItem {
    fn from(value: ColumnData) -> Self {
        ListItem::Value(value)
    }
}

impl From<NestedQuery> for ListItem {
    fn from(query: NestedQuery) -> Self {
        ListItem::Nested(query)
    }
}

impl<'de> Deserialize<'de> for ListItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListItemVisitor;

        impl<'de> Visitor<'de> for ListItemVisitor {
            type Value = ListItem;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a scalar or a nested query {tableName, selectedField, where}")
            }

            visit_scalars!(ListItem::Value);

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                NestedQuery::deserialize(de::value::MapAccessDeserializer::new(map)).map(ListItem::Nested)
            }
        }

        deserializer.deserialize_any(ListItemVisitor)
    }
}

/// A SELECT used as an element of an `IN` / `NOT_IN` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NestedQuery {
    pub table_name: String,
    pub selected_field: Vec<String>,
    #[serde(rename = "where", default)]
    pub filter: WhereExpression,
}

impl NestedQuery {
    pub fn new<I, S>(table_name: impl Into<String>, selected_field: I, filter: WhereExpression) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NestedQuery {
            table_name: table_name.into(),
            selected_field: selected_field.into_iter().map(Into::into).collect(),
            filter,
        }
    }
}

// =============================================================================
// Leaf Condition
// =============================================================================

/// One field's operator + value pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub op: Operator,
    pub value: WhereValue,
}

impl Condition {
    pub fn new(op: Operator, value: impl Into<WhereValue>) -> Self {
        Condition {
            op,
            value: value.into(),
        }
    }

    fn scalar(op: Operator, value: impl Into<ColumnData>) -> Self {
        Condition::new(op, value.into())
    }

    pub fn equals(value: impl Into<ColumnData>) -> Self {
        Condition::scalar(Operator::Equals, value)
    }

    pub fn not_equals(value: impl Into<ColumnData>) -> Self {
        Condition::scalar(Operator::NotEquals, value)
    }

    pub fn contains(value: impl Into<ColumnData>) -> Self {
        Condition::scalar(Operator::Contains, value)
    }

    pub fn greater_than(value: impl Into<ColumnData>) -> Self {
        Condition::scalar(Operator::GreaterThan, value)
    }

    pub fn lesser_than(value: impl Into<ColumnData>) -> Self {
        Condition::scalar(Operator::LesserThan, value)
    }

    /// `field IS NULL`.
    pub fn is_null() -> Self {
        Condition::scalar(Operator::Equals, ColumnData::Null)
    }

    /// `field IS NOT NULL`.
    pub fn is_not_null() -> Self {
        Condition::scalar(Operator::NotEquals, ColumnData::Null)
    }

    pub fn in_list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ListItem>,
    {
        Condition::new(
            Operator::In,
            items.into_iter().map(Into::into).collect::<Vec<_>>(),
        )
    }

    pub fn not_in<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ListItem>,
    {
        Condition::new(
            Operator::NotIn,
            items.into_iter().map(Into::into).collect::<Vec<_>>(),
        )
    }
}

// =============================================================================
// Simple Expression
// =============================================================================

/// Field → condition map; entries are AND-ed in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimpleWhereExpression(IndexMap<String, Condition>);

impl SimpleWhereExpression {
    pub fn new() -> Self {
        SimpleWhereExpression::default()
    }

    /// Adds (or replaces) the condition for `field`, builder style.
    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.0.insert(field.into(), condition);
        self
    }

    /// Adds (or replaces) the condition for `field`.
    pub fn insert(&mut self, field: impl Into<String>, condition: Condition) -> Option<Condition> {
        self.0.insert(field.into(), condition)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Condition)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Condition)> for SimpleWhereExpression {
    fn from_iter<I: IntoIterator<Item = (K, Condition)>>(iter: I) -> Self {
        SimpleWhereExpression(iter.into_iter().map(|(k, c)| (k.into(), c)).collect())
    }
}

// =============================================================================
// Compound Expression
// =============================================================================

/// A filter predicate tree.
///
/// `WhereExpression::default()` is the empty filter (`{}`), which compiles to
/// no WHERE clause at all.
///
/// ## JSON Errors
/// A node is either a field map or a single `AND` / `OR` key. An object that
/// mixes the two, or carries both `AND` and `OR`, is rejected rather than
/// losing conditions. Errors in a leaf name the field they belong to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "WhereRepr")]
pub enum WhereExpression {
    Simple(SimpleWhereExpression),
    And(Vec<WhereExpression>),
    Or(Vec<WhereExpression>),
}

impl Default for WhereExpression {
    fn default() -> Self {
        WhereExpression::Simple(SimpleWhereExpression::new())
    }
}

impl WhereExpression {
    /// The empty filter.
    pub fn none() -> Self {
        WhereExpression::default()
    }

    /// A single-field filter.
    pub fn field(field: impl Into<String>, condition: Condition) -> Self {
        WhereExpression::Simple(SimpleWhereExpression::new().with(field, condition))
    }

    /// Returns true if this is `{}` (a simple expression with no fields).
    ///
    /// An `AND`/`OR` node with only empty children is not "empty" here, but
    /// still compiles to no SQL.
    pub fn is_empty(&self) -> bool {
        matches!(self, WhereExpression::Simple(simple) if simple.is_empty())
    }

    /// Free-text search: `column_1 CONTAINS term OR column_2 CONTAINS term ...`.
    ///
    /// A blank term yields the empty filter.
    pub fn any_contains(columns: &[&str], term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() || columns.is_empty() {
            return WhereExpression::none();
        }
        WhereExpression::Or(
            columns
                .iter()
                .map(|column| WhereExpression::field(*column, Condition::contains(term)))
                .collect(),
        )
    }
}

impl From<SimpleWhereExpression> for WhereExpression {
    fn from(simple: SimpleWhereExpression) -> Self {
        WhereExpression::Simple(simple)
    }
}

/// Serialized form: `{"AND": [..]}`, `{"OR": [..]}` or a plain field map.
#[derive(Serialize)]
#[serde(untagged)]
enum WhereRepr {
    And {
        #[serde(rename = "AND")]
        and: Vec<WhereExpression>,
    },
    Or {
        #[serde(rename = "OR")]
        or: Vec<WhereExpression>,
    },
    Simple(SimpleWhereExpression),
}

impl From<WhereExpression> for WhereRepr {
    fn from(expr: WhereExpression) -> Self {
        match expr {
            WhereExpression::And(and) => WhereRepr::And { and },
            WhereExpression::Or(or) => WhereRepr::Or { or },
            WhereExpression::Simple(simple) => WhereRepr::Simple(simple),
        }
    }
}

impl<'de> Deserialize<'de> for WhereExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(WhereExpressionVisitor)
    }
}

struct WhereExpressionVisitor;

impl<'de> Visitor<'de> for WhereExpressionVisitor {
    type Value = WhereExpression;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of field conditions or a single `AND` / `OR` list")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut fields = SimpleWhereExpression::new();
        let mut compound: Option<(String, WhereExpression)> = None;

        while let Some(key) = map.next_key::<String>()? {
            if let Some((connective, _)) = &compound {
                return Err(de::Error::custom(format!(
                    "`{connective}` cannot share a node with `{key}`"
                )));
            }

            if key == "AND" || key == "OR" {
                if let Some((field, _)) = fields.iter().next() {
                    return Err(de::Error::custom(format!(
                        "`{key}` cannot share a node with `{field}`"
                    )));
                }
                let children: Vec<WhereExpression> = map.next_value()?;
                let node = if key == "AND" {
                    WhereExpression::And(children)
                } else {
                    WhereExpression::Or(children)
                };
                compound = Some((key, node));
            } else {
                if fields.0.contains_key(&key) {
                    return Err(de::Error::custom(format!("duplicate condition on `{key}`")));
                }
                let condition = map.next_value::<Condition>().map_err(|e| {
                    <A::Error as de::Error>::custom(format!("invalid condition on `{key}`: {e}"))
                })?;
                fields.insert(key, condition);
            }
        }

        Ok(match compound {
            Some((_, node)) => node,
            None => WhereExpression::Simple(fields),
        })
    }
}

// =============================================================================
// Column Set
// =============================================================================

/// Ordered column → value map written by INSERT and UPDATE.
///
/// For inserts it carries every column of the row; for updates, any subset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSet(IndexMap<String, ColumnData>);

impl ColumnSet {
    pub fn new() -> Self {
        ColumnSet::default()
    }

    /// Sets `column` to `value`, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<ColumnData>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Sets `column` only when `value` is present; used for partial updates.
    pub fn with_some<T: Into<ColumnData>>(self, column: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with(column, value),
            None => self,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnData)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Types that know how to write themselves as a column set.
pub trait ToColumnSet {
    fn to_column_set(&self) -> ColumnSet;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_compound_json() {
        let expr: WhereExpression = serde_json::from_value(json!({
            "OR": [
                { "author": { "op": "CONTAINS", "value": "Sudha Murthy" },
                  "publisher": { "op": "EQUALS", "value": "Penguin UK" } },
                { "totalCopies": { "op": "GREATER_THAN_EQUALS", "value": 10 } }
            ]
        }))
        .unwrap();

        let expected = WhereExpression::Or(vec![
            SimpleWhereExpression::new()
                .with("author", Condition::contains("Sudha Murthy"))
                .with("publisher", Condition::equals("Penguin UK"))
                .into(),
            WhereExpression::field(
                "totalCopies",
                Condition::new(Operator::GreaterThanEquals, ColumnData::Int(10)),
            ),
        ]);
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_deserialize_empty_and_null() {
        let empty: WhereExpression = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());

        let null: WhereExpression =
            serde_json::from_value(json!({ "returnDate": { "op": "EQUALS", "value": null } }))
                .unwrap();
        assert_eq!(null, WhereExpression::field("returnDate", Condition::is_null()));
    }

    #[test]
    fn test_deserialize_nested_query_in_list() {
        let expr: WhereExpression = serde_json::from_value(json!({
            "id": { "op": "IN", "value": [
                3,
                { "tableName": "transactions", "selectedField": ["member_id"],
                  "where": { "status": { "op": "EQUALS", "value": "Issued" } } }
            ] }
        }))
        .unwrap();

        let nested = NestedQuery::new(
            "transactions",
            ["member_id"],
            WhereExpression::field("status", Condition::equals("Issued")),
        );
        assert_eq!(
            expr,
            WhereExpression::field(
                "id",
                Condition::in_list([ListItem::value(3i64), ListItem::from(nested)])
            )
        );
    }

    #[test]
    fn test_mixed_connective_and_fields_is_rejected() {
        // An AND node carrying a field must not degrade into an empty filter
        let err = serde_json::from_value::<WhereExpression>(json!({
            "AND": [],
            "id": { "op": "EQUALS", "value": 5 }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("`AND` cannot share a node with `id`"), "{err}");

        let err = serde_json::from_value::<WhereExpression>(json!({
            "id": { "op": "EQUALS", "value": 5 },
            "OR": [ { "title": { "op": "EQUALS", "value": "Dune" } } ]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("`OR` cannot share a node with `id`"), "{err}");

        let err = serde_json::from_value::<WhereExpression>(json!({ "AND": [], "OR": [] }))
            .unwrap_err();
        assert!(err.to_string().contains("`AND` cannot share a node with `OR`"), "{err}");
    }

    #[test]
    fn test_bad_leaf_names_the_field() {
        let err = serde_json::from_value::<WhereExpression>(json!({
            "AND": [ { "title": { "op": "EQUALS", "value": { "x": 1 } } } ]
        }))
        .unwrap_err()
        .to_string();
        assert!(err.contains("`title`"), "{err}");
        assert!(err.contains("a scalar, null, or a list"), "{err}");

        let err = serde_json::from_value::<WhereExpression>(json!({
            "id": { "op": "IN", "value": [1, [2, 3]] }
        }))
        .unwrap_err()
        .to_string();
        assert!(err.contains("`id`"), "{err}");
        assert!(err.contains("a scalar or a nested query"), "{err}");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = serde_json::from_value::<WhereExpression>(json!({
            "pages": { "op": "GREATER_THAN", "value": 100, "negate": true }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("negate"), "{err}");

        let err = serde_json::from_value::<WhereExpression>(json!({
            "id": { "op": "IN", "value": [
                { "tableName": "transactions", "selectedFields": ["member_id"] }
            ] }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("selectedFields"), "{err}");
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let expr = WhereExpression::And(vec![WhereExpression::field(
            "title",
            Condition::new(Operator::NotStartsWith, ColumnData::from("A")),
        )]);
        assert_eq!(
            serde_json::to_value(&expr).unwrap(),
            json!({ "AND": [ { "title": { "op": "NOT_STARTS_WITH", "value": "A" } } ] })
        );
    }

    #[test]
    fn test_any_contains() {
        assert!(WhereExpression::any_contains(&["title"], "   ").is_empty());

        let expr = WhereExpression::any_contains(&["title", "isbn_no"], " 978 ");
        match expr {
            WhereExpression::Or(children) => {
                assert_eq!(children.len(), 2);
                assert_eq!(children[1], WhereExpression::field("isbn_no", Condition::contains("978")));
            }
            other => panic!("expected OR, got {other:?}"),
        }
    }

    #[test]
    fn test_column_set_with_some() {
        let set = ColumnSet::new()
            .with("title", "Wings of Fire")
            .with_some("pages", None::<i64>)
            .with_some("genre", Some("Biography"));
        let columns: Vec<&String> = set.iter().map(|(c, _)| c).collect();
        assert_eq!(columns, ["title", "genre"]);
    }
}

//! # Where-Clause Compiler
//!
//! Lowers a [`WhereExpression`] tree into a SQL boolean expression plus the
//! ordered parameter list that binds it.
//!
//! ## Recursion
//! ```text
//! compile(And[a, Or[b, c]])
//!   ├── compile(a)          → "(`x` = ?)"                 data [a]
//!   └── compile(Or[b, c])
//!         ├── compile(b)    → "(`y` LIKE ?)"              data [b]
//!         └── compile(c)    → "(`z` IN (?, (SELECT ..)))" data [c, sub..]
//!   result: "((`x` = ?) AND ((`y` LIKE ?) OR (`z` IN (?, (SELECT ..)))))"
//!           data [a, b, c, sub..]
//! ```
//!
//! Values are never written into the SQL text. `LIKE` wildcards are added to
//! the bound value, not to the statement.

use crate::error::{CoreError, CoreResult};

use super::expression::{Condition, ListItem, Operator, SimpleWhereExpression, WhereExpression, WhereValue};
use super::statement::generate_nested_select_sql;
use super::value::{ColumnData, Query};

/// Compiles a where-expression into `(sql, data)`.
///
/// The empty expression (and any AND/OR whose children are all empty)
/// compiles to `Query::empty()`; callers then omit the `WHERE` keyword.
pub fn generate_where_clause_sql(expr: &WhereExpression) -> CoreResult<Query> {
    match expr {
        WhereExpression::And(children) => compile_junction(children, " AND "),
        WhereExpression::Or(children) => compile_junction(children, " OR "),
        WhereExpression::Simple(simple) => compile_simple(simple),
    }
}

/// Quotes an identifier with backticks, doubling any embedded backtick.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn compile_junction(children: &[WhereExpression], joiner: &str) -> CoreResult<Query> {
    let mut fragments = Vec::with_capacity(children.len());
    let mut data = Vec::new();

    for child in children {
        let compiled = generate_where_clause_sql(child)?;
        if !compiled.sql.is_empty() {
            fragments.push(compiled.sql);
        }
        data.extend(compiled.data);
    }

    if fragments.is_empty() {
        return Ok(Query { sql: String::new(), data });
    }

    Ok(Query {
        sql: format!("({})", fragments.join(joiner)),
        data,
    })
}

fn compile_simple(expr: &SimpleWhereExpression) -> CoreResult<Query> {
    if expr.is_empty() {
        return Ok(Query::empty());
    }

    let mut fragments = Vec::with_capacity(expr.len());
    let mut data = Vec::new();
    for (field, condition) in expr.iter() {
        fragments.push(compile_condition(field, condition, &mut data)?);
    }

    Ok(Query {
        sql: format!("({})", fragments.join(" AND ")),
        data,
    })
}

fn compile_condition(field: &str, condition: &Condition, data: &mut Vec<ColumnData>) -> CoreResult<String> {
    if field.is_empty() {
        return Err(CoreError::malformed(field, "field name is empty"));
    }

    let column = quote_identifier(field);
    match &condition.value {
        WhereValue::Scalar(ColumnData::Null) => null_check(field, &column, condition.op),
        WhereValue::Scalar(value) => comparison(field, &column, condition.op, value, data),
        WhereValue::List(items) => membership(field, &column, condition.op, items, data),
    }
}

fn mismatch(field: &str, op: Operator, shape: &'static str) -> CoreError {
    CoreError::OperatorValueMismatch {
        field: field.to_string(),
        op,
        shape,
    }
}

/// `null` binds nothing: it becomes `IS NULL` / `IS NOT NULL`.
fn null_check(field: &str, column: &str, op: Operator) -> CoreResult<String> {
    match op {
        Operator::Equals => Ok(format!("{column} IS NULL")),
        Operator::NotEquals => Ok(format!("{column} IS NOT NULL")),
        other => Err(mismatch(field, other, "null")),
    }
}

fn comparison(
    field: &str,
    column: &str,
    op: Operator,
    value: &ColumnData,
    data: &mut Vec<ColumnData>,
) -> CoreResult<String> {
    let (sql_op, bound) = match op {
        Operator::Equals => ("=", value.clone()),
        Operator::NotEquals => ("!=", value.clone()),
        Operator::StartsWith => ("LIKE", ColumnData::Text(format!("{value}%"))),
        Operator::NotStartsWith => ("NOT LIKE", ColumnData::Text(format!("{value}%"))),
        Operator::EndsWith => ("LIKE", ColumnData::Text(format!("%{value}"))),
        Operator::NotEndsWith => ("NOT LIKE", ColumnData::Text(format!("%{value}"))),
        Operator::Contains => ("LIKE", ColumnData::Text(format!("%{value}%"))),
        Operator::NotContains => ("NOT LIKE", ColumnData::Text(format!("%{value}%"))),
        Operator::GreaterThan => (">", value.clone()),
        Operator::GreaterThanEquals => (">=", value.clone()),
        Operator::LesserThan => ("<", value.clone()),
        Operator::LesserThanEquals => ("<=", value.clone()),
        Operator::In | Operator::NotIn => return Err(mismatch(field, op, "scalar")),
    };

    data.push(bound);
    Ok(format!("{column} {sql_op} ?"))
}

fn membership(
    field: &str,
    column: &str,
    op: Operator,
    items: &[ListItem],
    data: &mut Vec<ColumnData>,
) -> CoreResult<String> {
    let keyword = match op {
        Operator::In => "IN",
        Operator::NotIn => "NOT IN",
        other => return Err(mismatch(field, other, "list")),
    };

    if items.is_empty() {
        return Err(CoreError::malformed(field, format!("{op} list has no elements")));
    }

    // A lone sub-select is a real subquery; inside a list it is a scalar element.
    if let [ListItem::Nested(nested)] = items {
        let sub = generate_nested_select_sql(nested)?;
        data.extend(sub.data);
        return Ok(format!("{column} {keyword} ({})", sub.sql));
    }

    let mut slots = Vec::with_capacity(items.len());
    for item in items {
        match item {
            ListItem::Value(value) => {
                data.push(value.clone());
                slots.push("?".to_string());
            }
            ListItem::Nested(nested) => {
                let sub = generate_nested_select_sql(nested)?;
                data.extend(sub.data);
                slots.push(format!("({})", sub.sql));
            }
        }
    }

    Ok(format!("{column} {keyword} ({})", slots.join(", ")))
}

// =============================================================================
// Unit Tests
// =============================================================================

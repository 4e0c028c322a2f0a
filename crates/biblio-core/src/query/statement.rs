//! # Statement Builders
//!
//! One function per statement kind. Each returns a [`Query`] whose `data`
//! binds the `?` placeholders of its `sql` in order.
//!
//! ```text
//! INSERT INTO `t` (c1, c2) VALUES (?, ?)
//! SELECT `f1`, `f2` FROM `t` WHERE (..) LIMIT n OFFSET m
//! UPDATE `t` SET c1 = ?, c2 = ? WHERE (..)          data: [set.., where..]
//! DELETE FROM `t` WHERE (..)
//! SELECT COUNT(*) AS `a` FROM `t` WHERE (..)
//! ```
//!
//! Table and column names are not validated; they come from repository
//! code, never from user input.

use crate::error::{CoreError, CoreResult};

use super::compiler::{generate_where_clause_sql, quote_identifier};
use super::expression::{ColumnSet, NestedQuery, WhereExpression};
use super::value::Query;

/// Appends ` WHERE <clause>` when the filter compiles to anything.
fn append_where(query: &mut Query, filter: &WhereExpression) -> CoreResult<()> {
    let clause = generate_where_clause_sql(filter)?;
    if !clause.is_empty() {
        query.sql.push_str(" WHERE ");
        query.sql.push_str(&clause.sql);
        query.data.extend(clause.data);
    }
    Ok(())
}

/// `INSERT INTO `table` (c1, c2, ...) VALUES (?, ?, ...)`.
///
/// An empty column set is rejected rather than emitting `() VALUES ()`.
pub fn generate_insert_sql(table: &str, row: &ColumnSet) -> CoreResult<Query> {
    if row.is_empty() {
        return Err(CoreError::EmptyColumnSet {
            statement: "INSERT",
            table: table.to_string(),
        });
    }

    let mut columns = Vec::with_capacity(row.len());
    let mut data = Vec::with_capacity(row.len());
    for (column, value) in row.iter() {
        columns.push(column.as_str());
        data.push(value.clone());
    }
    let placeholders = vec!["?"; columns.len()].join(", ");

    Ok(Query {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            quote_identifier(table),
            columns.join(", ")
        ),
        data,
    })
}

/// `SELECT <fields|*> FROM `table` [WHERE ..] [LIMIT n] [OFFSET m]`.
///
/// `None` omits a clause; `Some(0)` is emitted as written. An empty
/// `fields` slice selects `*`.
pub fn generate_select_sql(
    table: &str,
    filter: &WhereExpression,
    fields: &[&str],
    offset: Option<u64>,
    limit: Option<u64>,
) -> CoreResult<Query> {
    let projection = if fields.is_empty() {
        "*".to_string()
    } else {
        fields.iter().map(|f| quote_identifier(f)).collect::<Vec<_>>().join(", ")
    };

    let mut query = Query {
        sql: format!("SELECT {projection} FROM {}", quote_identifier(table)),
        data: Vec::new(),
    };
    append_where(&mut query, filter)?;

    if let Some(limit) = limit {
        query.sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = offset {
        query.sql.push_str(&format!(" OFFSET {offset}"));
    }

    Ok(query)
}

/// Compiles the sub-select of an `IN` list element.
pub(crate) fn generate_nested_select_sql(nested: &NestedQuery) -> CoreResult<Query> {
    if nested.selected_field.is_empty() {
        return Err(CoreError::malformed(
            nested.table_name.as_str(),
            "nested query must select at least one column",
        ));
    }
    let fields: Vec<&str> = nested.selected_field.iter().map(String::as_str).collect();
    generate_select_sql(&nested.table_name, &nested.filter, &fields, None, None)
}

/// `UPDATE `table` SET c1 = ?, c2 = ? [WHERE ..]`.
///
/// Set values bind before where values. An empty filter updates every row.
pub fn generate_update_sql(row: &ColumnSet, table: &str, filter: &WhereExpression) -> CoreResult<Query> {
    if row.is_empty() {
        return Err(CoreError::EmptyColumnSet {
            statement: "UPDATE",
            table: table.to_string(),
        });
    }

    let mut assignments = Vec::with_capacity(row.len());
    let mut data = Vec::with_capacity(row.len());
    for (column, value) in row.iter() {
        assignments.push(format!("{column} = ?"));
        data.push(value.clone());
    }

    let mut query = Query {
        sql: format!("UPDATE {} SET {}", quote_identifier(table), assignments.join(", ")),
        data,
    };
    append_where(&mut query, filter)?;
    Ok(query)
}

/// `DELETE FROM `table` [WHERE ..]`. An empty filter deletes every row.
pub fn generate_delete_sql(table: &str, filter: &WhereExpression) -> CoreResult<Query> {
    let mut query = Query {
        sql: format!("DELETE FROM {}", quote_identifier(table)),
        data: Vec::new(),
    };
    append_where(&mut query, filter)?;
    Ok(query)
}

/// `SELECT COUNT(*|`column`) [AS `alias`] FROM `table` [WHERE ..]`.
///
/// Read the result with [`count_result_key`].
pub fn generate_count_sql(
    table: &str,
    filter: &WhereExpression,
    column: Option<&str>,
    alias: Option<&str>,
) -> CoreResult<Query> {
    let mut sql = format!("SELECT {}", count_expression(column));
    if let Some(alias) = alias {
        sql.push_str(&format!(" AS {}", quote_identifier(alias)));
    }
    sql.push_str(&format!(" FROM {}", quote_identifier(table)));

    let mut query = Query { sql, data: Vec::new() };
    append_where(&mut query, filter)?;
    Ok(query)
}

/// Name of the result column produced by [`generate_count_sql`].
pub fn count_result_key(column: Option<&str>, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => alias.to_string(),
        None => count_expression(column),
    }
}

fn count_expression(column: Option<&str>) -> String {
    match column {
        Some(column) => format!("COUNT({})", quote_identifier(column)),
        None => "COUNT(*)".to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expression::{Condition, ListItem, Operator};
    use crate::query::value::ColumnData;

    fn text(s: &str) -> ColumnData {
        ColumnData::Text(s.to_string())
    }

    #[test]
    fn test_insert() {
        let row = ColumnSet::new().with("title", "X").with("pages", 5i64);
        let q = generate_insert_sql("books", &row).unwrap();
        assert_eq!(q.sql, "INSERT INTO `books` (title, pages) VALUES (?, ?)");
        assert_eq!(q.data, vec![text("X"), ColumnData::Int(5)]);
    }

    #[test]
    fn test_insert_rejects_empty_column_set() {
        assert!(matches!(
            generate_insert_sql("books", &ColumnSet::new()),
            Err(CoreError::EmptyColumnSet { statement: "INSERT", .. })
        ));
    }

    #[test]
    fn test_select_with_where_and_pagination() {
        let filter = WhereExpression::field("genre", Condition::equals("Computers"));
        let q = generate_select_sql("books", &filter, &[], Some(1), Some(10)).unwrap();
        assert_eq!(q.sql, "SELECT * FROM `books` WHERE (`genre` = ?) LIMIT 10 OFFSET 1");
        assert_eq!(q.data, vec![text("Computers")]);
    }

    #[test]
    fn test_select_projection_without_where() {
        let q = generate_select_sql("books", &WhereExpression::none(), &["author"], None, Some(10)).unwrap();
        assert_eq!(q.sql, "SELECT `author` FROM `books` LIMIT 10");
        assert!(q.data.is_empty());
    }

    #[test]
    fn test_select_zero_limit_is_explicit() {
        let q = generate_select_sql("books", &WhereExpression::none(), &[], Some(0), Some(0)).unwrap();
        assert_eq!(q.sql, "SELECT * FROM `books` LIMIT 0 OFFSET 0");

        let q = generate_select_sql("books", &WhereExpression::none(), &[], None, None).unwrap();
        assert_eq!(q.sql, "SELECT * FROM `books`");
    }

    #[test]
    fn test_select_with_not_in() {
        let filter = WhereExpression::field(
            "title",
            Condition::not_in([ListItem::value("Jai Hind"), ListItem::value("Vande Mataram"), ListItem::value(true)]),
        );
        let q = generate_select_sql("books", &filter, &[], None, Some(10)).unwrap();
        assert_eq!(q.sql, "SELECT * FROM `books` WHERE (`title` NOT IN (?, ?, ?)) LIMIT 10");
        assert_eq!(q.data, vec![text("Jai Hind"), text("Vande Mataram"), ColumnData::Bool(true)]);
    }

    #[test]
    fn test_update_binds_set_values_before_where() {
        let row = ColumnSet::new().with("title", "Y");
        let filter = WhereExpression::field("id", Condition::equals(5i64));
        let q = generate_update_sql(&row, "books", &filter).unwrap();
        assert_eq!(q.sql, "UPDATE `books` SET title = ? WHERE (`id` = ?)");
        assert!(q.sql.ends_with("WHERE (`id` = ?)"));
        assert_eq!(q.data, vec![text("Y"), ColumnData::Int(5)]);
    }

    #[test]
    fn test_update_multiple_columns_without_where() {
        let row = ColumnSet::new().with("title", "Meghalya").with("pages", 300i64);
        let q = generate_update_sql(&row, "books", &WhereExpression::none()).unwrap();
        assert_eq!(q.sql, "UPDATE `books` SET title = ?, pages = ?");
        assert_eq!(q.data, vec![text("Meghalya"), ColumnData::Int(300)]);
    }

    #[test]
    fn test_update_rejects_empty_column_set() {
        let filter = WhereExpression::field("id", Condition::equals(5i64));
        assert!(matches!(
            generate_update_sql(&ColumnSet::new(), "books", &filter),
            Err(CoreError::EmptyColumnSet { statement: "UPDATE", .. })
        ));
    }

    #[test]
    fn test_delete() {
        let filter = WhereExpression::Or(vec![
            WhereExpression::field("title", Condition::contains("Akshay")),
            WhereExpression::field("publisher", Condition::equals("Penguin")),
        ]);
        let q = generate_delete_sql("books", &filter).unwrap();
        assert_eq!(q.sql, "DELETE FROM `books` WHERE ((`title` LIKE ?) OR (`publisher` = ?))");
        assert_eq!(q.data, vec![text("%Akshay%"), text("Penguin")]);

        let q = generate_delete_sql("books", &WhereExpression::none()).unwrap();
        assert_eq!(q.sql, "DELETE FROM `books`");
    }

    #[test]
    fn test_count_variants() {
        let q = generate_count_sql("books", &WhereExpression::none(), None, None).unwrap();
        assert_eq!(q.sql, "SELECT COUNT(*) FROM `books`");
        assert_eq!(count_result_key(None, None), "COUNT(*)");

        let filter = WhereExpression::field("genre", Condition::new(Operator::StartsWith, text("Fic")));
        let q = generate_count_sql("books", &filter, Some("id"), Some("total")).unwrap();
        assert_eq!(q.sql, "SELECT COUNT(`id`) AS `total` FROM `books` WHERE (`genre` LIKE ?)");
        assert_eq!(q.data, vec![text("Fic%")]);
        assert_eq!(count_result_key(Some("id"), Some("total")), "total");
        assert_eq!(count_result_key(Some("id"), None), "COUNT(`id`)");
    }

    #[test]
    fn test_nested_query_requires_projection() {
        let nested = NestedQuery::new("transactions", Vec::<String>::new(), WhereExpression::none());
        let filter = WhereExpression::field("id", Condition::in_list([nested]));
        assert!(matches!(
            generate_select_sql("members", &filter, &[], None, None),
            Err(CoreError::MalformedExpression { .. })
        ));
    }
}

//! # Repository Module
//!
//! Database repository implementations for Biblio.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Repository Call Runs                           │
//! │                                                                         │
//! │  db.books().list(&PageRequest::new(10, 0).search("tolkien"))           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BookRepository                                                        │
//! │  ├── validate input (biblio_core::validation)                          │
//! │  ├── build WhereExpression / ColumnSet                                 │
//! │  └── generate_*_sql(..) ──► Query { sql, data }                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  executor::{execute, fetch_all, fetch_optional, fetch_count}           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BookRepository`](book::BookRepository) - Book CRUD, search and copy counts
//! - [`MemberRepository`](member::MemberRepository) - Member CRUD and lookups
//! - [`TransactionRepository`](transaction::TransactionRepository) - Issuing and returning loans

pub mod book;
pub mod member;
pub mod transaction;

use biblio_core::query::{
    count_result_key, generate_count_sql, generate_delete_sql, generate_select_sql, Condition, WhereExpression,
};
use biblio_core::{PageRequest, PageResponse, Pagination};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{Executor, FromRow};

use crate::error::DbResult;
use crate::executor;

/// Alias under which listings read their total.
const TOTAL_ALIAS: &str = "total";

/// `id = ?` filter.
pub(crate) fn by_id(id: i64) -> WhereExpression {
    WhereExpression::field("id", Condition::equals(id))
}

/// Filter for a listing's search term: `CONTAINS` on each column, OR-ed.
///
/// A request without a (non-blank) term matches everything.
pub(crate) fn search_filter(page: &PageRequest, columns: &[&str]) -> WhereExpression {
    page.search_term()
        .map(|term| WhereExpression::any_contains(columns, term))
        .unwrap_or_default()
}

/// Fetches the first row matching `filter`.
pub(crate) async fn find_one<'c, E, T>(conn: E, table: &str, filter: &WhereExpression) -> DbResult<Option<T>>
where
    E: Executor<'c, Database = Sqlite>,
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let query = generate_select_sql(table, filter, &[], None, Some(1))?;
    executor::fetch_optional(conn, &query).await
}

/// Counts rows matching `filter`.
pub(crate) async fn count_where<'c, E>(conn: E, table: &str, filter: &WhereExpression) -> DbResult<u64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let query = generate_count_sql(table, filter, None, Some(TOTAL_ALIAS))?;
    executor::fetch_count(conn, &query, &count_result_key(None, Some(TOTAL_ALIAS))).await
}

/// Deletes rows matching `filter`, returning how many went.
pub(crate) async fn delete_where<'c, E>(conn: E, table: &str, filter: &WhereExpression) -> DbResult<u64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let query = generate_delete_sql(table, filter)?;
    Ok(executor::execute(conn, &query).await?.rows_affected)
}

/// One page of rows matching `filter`, with the total the filter matches.
///
/// The total is counted with the same filter, so it ignores limit/offset but
/// not the search.
pub(crate) async fn fetch_page<T>(
    pool: &sqlx::SqlitePool,
    table: &str,
    filter: &WhereExpression,
    page: &PageRequest,
) -> DbResult<PageResponse<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let query = generate_select_sql(table, filter, &[], Some(page.offset), Some(page.limit))?;
    let items = executor::fetch_all(pool, &query).await?;
    let total = count_where(pool, table, filter).await?;

    Ok(PageResponse {
        items,
        pagination: Pagination {
            offset: page.offset,
            limit: page.limit,
            total,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_core::query::generate_where_clause_sql;

    #[test]
    fn test_search_filter() {
        let page = PageRequest::new(10, 0).search("rowling");
        let clause = generate_where_clause_sql(&search_filter(&page, &["title", "isbn_no"])).unwrap();
        assert_eq!(clause.sql, "((`title` LIKE ?) OR (`isbn_no` LIKE ?))");
        assert_eq!(clause.data.len(), 2);

        assert!(search_filter(&PageRequest::new(10, 0), &["title"]).is_empty());
        assert!(search_filter(&PageRequest::new(10, 0).search("   "), &["title"]).is_empty());
    }
}

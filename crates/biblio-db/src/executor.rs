//! # Query Executor
//!
//! Runs a generated [`Query`] against SQLite.
//!
//! ## Binding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Query {                                                                │
//! │    sql:  "SELECT * FROM `books` WHERE (`genre` = ? AND `pages` > ?)",   │
//! │    data: [Text("Fiction"), Int(300)]                                    │
//! │  }                                                                      │
//! │       │                                                                 │
//! │       ▼  one SqliteArguments entry per value, in order                  │
//! │  ?1 ← 'Fiction'    ?2 ← 300                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  &SqlitePool  or  &mut *tx   (anything implementing sqlx::Executor)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are never spliced into the SQL text.

use biblio_core::{ColumnData, Query};
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Arguments, Executor, FromRow, Row};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Row id of the last inserted row on this connection.
    pub last_insert_id: i64,
}

fn bind_arguments<'q>(data: &[ColumnData]) -> DbResult<SqliteArguments<'q>> {
    let mut args = SqliteArguments::default();

    for value in data {
        let added = match value {
            ColumnData::Null => args.add(Option::<String>::None),
            ColumnData::Bool(b) => args.add(*b),
            ColumnData::Int(i) => args.add(*i),
            ColumnData::Float(f) => args.add(*f),
            ColumnData::Text(s) => args.add(s.clone()),
        };
        added.map_err(|e| DbError::QueryFailed(format!("could not bind parameter: {e}")))?;
    }

    Ok(args)
}

/// Runs an INSERT, UPDATE or DELETE.
pub async fn execute<'c, E>(executor: E, query: &Query) -> DbResult<ExecOutcome>
where
    E: Executor<'c, Database = Sqlite>,
{
    debug!(sql = %query.sql, params = query.data.len(), "Executing statement");

    let args = bind_arguments(&query.data)?;
    let result = sqlx::query_with(&query.sql, args).execute(executor).await?;

    Ok(ExecOutcome {
        rows_affected: result.rows_affected(),
        last_insert_id: result.last_insert_rowid(),
    })
}

/// Runs a SELECT and maps every row to `T`.
pub async fn fetch_all<'c, E, T>(executor: E, query: &Query) -> DbResult<Vec<T>>
where
    E: Executor<'c, Database = Sqlite>,
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    debug!(sql = %query.sql, params = query.data.len(), "Fetching rows");

    let args = bind_arguments(&query.data)?;
    let rows = sqlx::query_as_with::<_, T, _>(&query.sql, args)
        .fetch_all(executor)
        .await?;

    debug!(count = rows.len(), "Query returned rows");
    Ok(rows)
}

/// Runs a SELECT and maps the first row, if any, to `T`.
pub async fn fetch_optional<'c, E, T>(executor: E, query: &Query) -> DbResult<Option<T>>
where
    E: Executor<'c, Database = Sqlite>,
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    debug!(sql = %query.sql, params = query.data.len(), "Fetching optional row");

    let args = bind_arguments(&query.data)?;
    let row = sqlx::query_as_with::<_, T, _>(&query.sql, args)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Runs a COUNT query and reads the count from the column named `key`.
///
/// `key` comes from [`biblio_core::query::count_result_key`].
pub async fn fetch_count<'c, E>(executor: E, query: &Query, key: &str) -> DbResult<u64>
where
    E: Executor<'c, Database = Sqlite>,
{
    debug!(sql = %query.sql, params = query.data.len(), "Counting rows");

    let args = bind_arguments(&query.data)?;
    let row = sqlx::query_with(&query.sql, args).fetch_one(executor).await?;
    let count: i64 = row.try_get(key)?;

    u64::try_from(count).map_err(|_| DbError::Internal(format!("negative row count {count}")))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_core::query::{
        count_result_key, generate_count_sql, generate_insert_sql, generate_select_sql, ColumnSet, Condition,
        WhereExpression,
    };
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    #[derive(Debug, sqlx::FromRow)]
    struct Note {
        id: i64,
        body: Option<String>,
        score: f64,
        pinned: bool,
    }

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT, score REAL NOT NULL, pinned BOOLEAN NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_every_value_kind_round_trips_through_bind() {
        let pool = pool().await;

        let row = ColumnSet::new()
            .with("body", ColumnData::Null)
            .with("score", 4.5)
            .with("pinned", true);
        let outcome = execute(&pool, &generate_insert_sql("notes", &row).unwrap()).await.unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.last_insert_id, 1);

        let filter = WhereExpression::field("id", Condition::equals(outcome.last_insert_id));
        let select = generate_select_sql("notes", &filter, &[], None, None).unwrap();
        let note: Note = fetch_optional(&pool, &select).await.unwrap().unwrap();
        assert_eq!(note.id, 1);
        assert_eq!(note.body, None);
        assert_eq!(note.score, 4.5);
        assert!(note.pinned);
    }

    #[tokio::test]
    async fn test_fetch_count_reads_aliased_and_plain_keys() {
        let pool = pool().await;
        for body in ["a", "b", "c"] {
            let row = ColumnSet::new().with("body", body).with("score", 1.0).with("pinned", false);
            execute(&pool, &generate_insert_sql("notes", &row).unwrap()).await.unwrap();
        }

        let plain = generate_count_sql("notes", &WhereExpression::none(), None, None).unwrap();
        assert_eq!(fetch_count(&pool, &plain, &count_result_key(None, None)).await.unwrap(), 3);

        let filter = WhereExpression::field("body", Condition::not_equals("a"));
        let aliased = generate_count_sql("notes", &filter, Some("id"), Some("total")).unwrap();
        let key = count_result_key(Some("id"), Some("total"));
        assert_eq!(fetch_count(&pool, &aliased, &key).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_and_missing_row() {
        let pool = pool().await;
        let select = generate_select_sql("notes", &WhereExpression::none(), &[], None, Some(5)).unwrap();
        let notes: Vec<Note> = fetch_all(&pool, &select).await.unwrap();
        assert!(notes.is_empty());

        let missing = generate_select_sql("notes", &WhereExpression::field("id", Condition::equals(9i64)), &[], None, None)
            .unwrap();
        let note: Option<Note> = fetch_optional(&pool, &missing).await.unwrap();
        assert!(note.is_none());
    }

    #[tokio::test]
    async fn test_sql_errors_are_categorized() {
        let pool = pool().await;
        let select = generate_select_sql("no_such_table", &WhereExpression::none(), &[], None, None).unwrap();
        let err = fetch_all::<_, Note>(&pool, &select).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}

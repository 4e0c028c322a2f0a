//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError (bad filter / empty column set / invalid input)             │
//! │       │                                                                 │
//! │       │     SQLite Error (sqlx::Error)                                 │
//! │       │          │                                                      │
//! │       ▼          ▼                                                      │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller (API layer, seed tool) maps to a user-facing message           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use biblio_core::{CoreError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Errors returned by the repositories.
///
/// Query-generation failures arrive as [`DbError::Query`]; everything SQLite
/// reports is sorted into a variant a caller can act on.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row has the requested key.
    ///
    /// ## When This Occurs
    /// - Lookup, update or delete of an id that isn't stored
    /// - A loan points at a member that has been removed
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// A value collides with a UNIQUE column.
    ///
    /// `value` is only known when the repository that wrote the row fills it
    /// in; SQLite reports the column alone.
    ///
    /// ## When This Occurs
    /// - Two members registered with one email
    #[error("{}", taken(.field, .value.as_deref()))]
    UniqueViolation {
        field: String,
        value: Option<String>,
    },

    /// A row points at a parent that doesn't exist, or a parent still has
    /// children.
    ///
    /// ## When This Occurs
    /// - Loan for an unknown book
    /// - Deleting a book or member with loans on record
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        message: String,
    },

    /// The row exists but its state forbids the change.
    ///
    /// ## When This Occurs
    /// - Issuing a book whose copies are all out
    /// - Returning a loan twice
    #[error("{0}")]
    Conflict(String),

    /// The statement could not be built from the request.
    #[error(transparent)]
    Query(#[from] CoreError),

    /// Input rejected before any SQL ran.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The database file could not be opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Schema setup did not complete.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected a statement.
    ///
    /// ## When This Occurs
    /// - A CHECK or NOT NULL column refused the value
    /// - A parameter could not be bound
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// COMMIT did not go through.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Anything sqlx reports that fits none of the above.
    #[error("Internal database error: {0}")]
    Internal(String),
}

fn taken(field: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("Duplicate {field}: '{value}' already exists"),
        None => format!("Duplicate {field}: value already exists"),
    }
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// A UNIQUE collision on `field` with the offending `value`.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: Some(value.into()),
        }
    }

    /// Checks if this error means the row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// Pulls the column out of SQLite's `UNIQUE constraint failed: members.email`.
///
/// Composite keys list several `table.column` pairs; the first is reported.
fn unique_column(message: &str) -> Option<&str> {
    let columns = message.split_once("constraint failed:")?.1;
    let first = columns.split(',').next()?.trim();
    let column = first.rsplit_once('.').map_or(first, |(_, column)| column);
    (!column.is_empty()).then_some(column)
}

/// Sorts sqlx failures by what the caller can do about them.
///
/// Constraint failures are told apart by [`ErrorKind`], not by message text;
/// the message is only read to recover the column name.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => DbError::UniqueViolation {
                    field: unique_column(db_err.message()).unwrap_or("unknown").to_string(),
                    value: None,
                },
                ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            sqlx::Error::ColumnNotFound(column) => DbError::QueryFailed(format!("no column named `{column}` in result")),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Connection, SqliteConnection};

    #[test]
    fn test_core_errors_pass_through() {
        let err: DbError = CoreError::malformed("id", "IN list must not be empty").into();
        assert_eq!(err.to_string(), "Malformed expression on `id`: IN list must not be empty");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(DbError::from(sqlx::Error::RowNotFound).is_not_found());
        assert!(!DbError::from(sqlx::Error::PoolTimedOut).is_not_found());
    }

    #[test]
    fn test_unique_column_strips_table() {
        assert_eq!(unique_column("UNIQUE constraint failed: members.email"), Some("email"));
        assert_eq!(
            unique_column("UNIQUE constraint failed: loans.book_id, loans.member_id"),
            Some("book_id")
        );
        assert_eq!(unique_column("UNIQUE constraint failed: "), None);
        assert_eq!(unique_column("disk I/O error"), None);
    }

    #[test]
    fn test_duplicate_message() {
        assert_eq!(
            DbError::duplicate("email", "asha@example.com").to_string(),
            "Duplicate email: 'asha@example.com' already exists"
        );
    }

    #[tokio::test]
    async fn test_sqlite_unique_failure_reports_column() {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE members (id INTEGER PRIMARY KEY, email TEXT NOT NULL UNIQUE)")
            .execute(&mut conn)
            .await
            .unwrap();
        let insert = "INSERT INTO members (email) VALUES ('asha@example.com')";
        sqlx::query(insert).execute(&mut conn).await.unwrap();

        let err = DbError::from(sqlx::query(insert).execute(&mut conn).await.unwrap_err());
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "email");
                assert_eq!(value, None);
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }
}

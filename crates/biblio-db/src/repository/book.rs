//! # Book Repository
//!
//! Database operations for the catalogue.
//!
//! ## Copy Accounting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   0  ≤  available_copies  ≤  total_copies                               │
//! │                                                                         │
//! │   create      available = total                                        │
//! │   issue       available - 1   (refused at 0)                           │
//! │   return      available + 1   (refused at total)                       │
//! │                                                                         │
//! │   Every change goes through adjust_copies(), which re-reads the row    │
//! │   and only writes if it has not moved underneath.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use biblio_core::query::{
    generate_insert_sql, generate_update_sql, ColumnSet, Condition, SimpleWhereExpression, ToColumnSet, WhereExpression,
};
use biblio_core::validation::{validate_book_update, validate_isbn, validate_new_book, validate_page_request};
use biblio_core::{Book, BookUpdate, NewBook, PageRequest, PageResponse, MAX_PAGE_LIMIT};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{by_id, count_where, delete_where, fetch_page, find_one, search_filter};
use crate::error::{DbError, DbResult};
use crate::executor;

/// Columns a free-text book search looks at.
const SEARCH_COLUMNS: &[&str] = &["title", "isbn_no"];

/// Repository for book database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = BookRepository::new(pool);
///
/// let book = repo.create(&new_book).await?;
/// let page = repo.list(&PageRequest::new(10, 0).search("978")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
    max_page_limit: u64,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository {
            pool,
            max_page_limit: MAX_PAGE_LIMIT,
        }
    }

    /// Sets the largest page [`list`](Self::list) will serve.
    pub fn max_page_limit(mut self, max: u64) -> Self {
        self.max_page_limit = max;
        self
    }

    /// Adds a book to the catalogue with every copy available.
    ///
    /// ## Returns
    /// * `Ok(Book)` - The stored book, with its generated id
    /// * `Err(DbError::Validation)` - A field failed validation
    pub async fn create(&self, book: &NewBook) -> DbResult<Book> {
        validate_new_book(book)?;
        debug!(isbn = %book.isbn_no, "Inserting book");

        let query = generate_insert_sql(Book::TABLE, &book.to_column_set())?;
        let outcome = executor::execute(&self.pool, &query).await?;

        self.get_by_id(outcome.last_insert_id)
            .await?
            .ok_or_else(|| DbError::not_found("Book", outcome.last_insert_id))
    }

    /// Gets a book by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Book))` - Book found
    /// * `Ok(None)` - Book not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Book>> {
        find_one(&self.pool, Book::TABLE, &by_id(id)).await
    }

    /// Gets a book by its 13-digit ISBN.
    pub async fn get_by_isbn(&self, isbn: &str) -> DbResult<Option<Book>> {
        validate_isbn(isbn)?;
        find_one(&self.pool, Book::TABLE, &WhereExpression::field("isbn_no", Condition::equals(isbn))).await
    }

    /// Applies a partial update and returns the updated book.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Book doesn't exist
    /// * `Err(DbError::Query)` - The update sets no fields
    pub async fn update(&self, id: i64, update: &BookUpdate) -> DbResult<Book> {
        validate_book_update(update)?;
        debug!(id, "Updating book");

        let query = generate_update_sql(&update.to_column_set(), Book::TABLE, &by_id(id))?;
        let outcome = executor::execute(&self.pool, &query).await?;
        if outcome.rows_affected == 0 {
            return Err(DbError::not_found("Book", id));
        }

        self.get_by_id(id).await?.ok_or_else(|| DbError::not_found("Book", id))
    }

    /// Deletes a book and returns what was deleted.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Book doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Loans still reference it
    pub async fn delete(&self, id: i64) -> DbResult<Book> {
        let book = self.get_by_id(id).await?.ok_or_else(|| DbError::not_found("Book", id))?;

        debug!(id, "Deleting book");
        if delete_where(&self.pool, Book::TABLE, &by_id(id)).await? == 0 {
            return Err(DbError::not_found("Book", id));
        }

        Ok(book)
    }

    /// Lists books, optionally searching title and ISBN.
    pub async fn list(&self, page: &PageRequest) -> DbResult<PageResponse<Book>> {
        validate_page_request(page, self.max_page_limit)?;
        fetch_page(&self.pool, Book::TABLE, &search_filter(page, SEARCH_COLUMNS), page).await
    }

    /// Lists books with at least one copy on the shelf.
    pub async fn list_available(&self, page: &PageRequest) -> DbResult<PageResponse<Book>> {
        validate_page_request(page, self.max_page_limit)?;
        let filter = WhereExpression::And(vec![
            WhereExpression::field("available_copies", Condition::greater_than(0i64)),
            search_filter(page, SEARCH_COLUMNS),
        ]);
        fetch_page(&self.pool, Book::TABLE, &filter, page).await
    }

    /// Moves `delta` copies on or off the shelf.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - The count would leave `0..=total_copies`
    pub async fn adjust_available_copies(&self, id: i64, delta: i64) -> DbResult<Book> {
        let mut conn = self.pool.acquire().await?;
        adjust_copies(&mut conn, id, delta).await
    }

    /// Counts books in the catalogue.
    pub async fn count(&self) -> DbResult<u64> {
        count_where(&self.pool, Book::TABLE, &WhereExpression::none()).await
    }

    /// Deletes every book. Returns the number removed.
    pub async fn delete_all(&self) -> DbResult<u64> {
        delete_where(&self.pool, Book::TABLE, &WhereExpression::none()).await
    }
}

/// Adjusts a book's available copies on an open connection or transaction.
///
/// The write is guarded by the value just read, so a concurrent change makes
/// this fail with a conflict instead of overwriting it.
pub(crate) async fn adjust_copies(conn: &mut SqliteConnection, id: i64, delta: i64) -> DbResult<Book> {
    let book: Book = find_one(&mut *conn, Book::TABLE, &by_id(id))
        .await?
        .ok_or_else(|| DbError::not_found("Book", id))?;

    let available = book.available_copies + delta;
    if available < 0 {
        return Err(DbError::Conflict(format!("Book {id} has no available copies")));
    }
    if available > book.total_copies {
        return Err(DbError::Conflict(format!(
            "Book {id} already has all {} copies available",
            book.total_copies
        )));
    }

    debug!(id, delta, available, "Adjusting available copies");

    let guard = WhereExpression::from(
        SimpleWhereExpression::new()
            .with("id", Condition::equals(id))
            .with("available_copies", Condition::equals(book.available_copies)),
    );
    let query = generate_update_sql(&ColumnSet::new().with("available_copies", available), Book::TABLE, &guard)?;
    if executor::execute(&mut *conn, &query).await?.rows_affected == 0 {
        return Err(DbError::Conflict(format!("Book {id} changed while adjusting copies")));
    }

    Ok(Book {
        available_copies: available,
        ..book
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

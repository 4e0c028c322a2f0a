//! # Transaction Repository
//!
//! Database operations for loans: a book issued to a member.
//!
//! ## Loan Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Loan Lifecycle                                    │
//! │                                                                         │
//! │  1. ISSUE  (one SQL transaction)                                       │
//! │     ├── member must exist                                              │
//! │     ├── book.available_copies - 1   (fails at 0)                       │
//! │     └── INSERT loan { status: Issued, due_date: today + period }       │
//! │                                                                         │
//! │  2. (OPTIONAL) OVERDUE                                                 │
//! │     └── mark_overdue(today): Issued and due_date < today → OverDue     │
//! │                                                                         │
//! │  3. RETURN  (one SQL transaction)                                      │
//! │     ├── loan must be Issued or OverDue                                 │
//! │     ├── UPDATE loan { status: Returned, return_date: today }           │
//! │     └── book.available_copies + 1                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dates are passed in rather than read from the clock, so callers decide
//! what "today" is.

use biblio_core::query::{
    generate_insert_sql, generate_select_sql, generate_update_sql, ColumnSet, Condition, ListItem, SimpleWhereExpression,
    WhereExpression,
};
use biblio_core::validation::validate_page_request;
use biblio_core::{Member, NewTransaction, PageRequest, PageResponse, Transaction, TransactionStatus, MAX_PAGE_LIMIT};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::book::adjust_copies;
use super::{by_id, count_where, delete_where, fetch_page, find_one, search_filter};
use crate::error::{DbError, DbResult};
use crate::executor;

/// Columns a free-text loan search looks at.
const SEARCH_COLUMNS: &[&str] = &["book_id", "member_id"];

/// `status IN ('Issued', 'OverDue')`: the book is still out.
fn outstanding() -> Condition {
    Condition::in_list([
        ListItem::value(TransactionStatus::Issued),
        ListItem::value(TransactionStatus::OverDue),
    ])
}

/// Repository for loan database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
    loan_period_days: i64,
    max_page_limit: u64,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository issuing loans for `loan_period_days`.
    pub fn new(pool: SqlitePool, loan_period_days: i64) -> Self {
        TransactionRepository {
            pool,
            loan_period_days,
            max_page_limit: MAX_PAGE_LIMIT,
        }
    }

    /// Sets the largest page [`list`](Self::list) will serve.
    pub fn max_page_limit(mut self, max: u64) -> Self {
        self.max_page_limit = max;
        self
    }

    /// Issues a book to a member on `today`.
    ///
    /// ## What This Does
    /// All in one SQL transaction; nothing is written if any step fails.
    /// 1. Checks the member exists
    /// 2. Takes one copy of the book off the shelf
    /// 3. Inserts an `Issued` loan due `loan_period_days` after `today`
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Book or member doesn't exist
    /// * `Err(DbError::Conflict)` - No copy of the book is available
    /// * `Err(DbError::Query)` - The loan period is out of range or the due
    ///   date cannot be represented
    pub async fn issue(&self, loan: NewTransaction, today: NaiveDate) -> DbResult<Transaction> {
        debug!(book_id = loan.book_id, member_id = loan.member_id, "Issuing book");

        let columns = loan.issue_columns(today, self.loan_period_days)?;

        let mut tx = self.pool.begin().await?;

        let member: Option<Member> = find_one(&mut *tx, Member::TABLE, &by_id(loan.member_id)).await?;
        if member.is_none() {
            return Err(DbError::not_found("Member", loan.member_id));
        }

        adjust_copies(&mut tx, loan.book_id, -1).await?;

        let insert = generate_insert_sql(Transaction::TABLE, &columns)?;
        let outcome = executor::execute(&mut *tx, &insert).await?;

        let issued: Transaction = find_one(&mut *tx, Transaction::TABLE, &by_id(outcome.last_insert_id))
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", outcome.last_insert_id))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = issued.id, due_date = %issued.due_date, "Book issued");
        Ok(issued)
    }

    /// Records the return of a loan on `today`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Loan doesn't exist
    /// * `Err(DbError::Conflict)` - Loan was already returned
    pub async fn return_book(&self, id: i64, today: NaiveDate) -> DbResult<Transaction> {
        debug!(id, "Returning book");

        let mut tx = self.pool.begin().await?;

        let loan: Transaction = find_one(&mut *tx, Transaction::TABLE, &by_id(id))
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))?;
        if !loan.status.is_outstanding() {
            return Err(DbError::Conflict(format!("Transaction {id} is already returned")));
        }

        let returned = ColumnSet::new()
            .with("status", TransactionStatus::Returned)
            .with("return_date", today);
        let guard = WhereExpression::from(
            SimpleWhereExpression::new()
                .with("id", Condition::equals(id))
                .with("status", outstanding()),
        );
        let update = generate_update_sql(&returned, Transaction::TABLE, &guard)?;
        if executor::execute(&mut *tx, &update).await?.rows_affected == 0 {
            return Err(DbError::Conflict(format!("Transaction {id} changed while returning")));
        }

        adjust_copies(&mut tx, loan.book_id, 1).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id, book_id = loan.book_id, "Book returned");
        Ok(Transaction {
            status: TransactionStatus::Returned,
            return_date: Some(today),
            ..loan
        })
    }

    /// Gets a loan by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        find_one(&self.pool, Transaction::TABLE, &by_id(id)).await
    }

    /// Deletes a loan record and returns what was deleted.
    ///
    /// Copy counts are not touched; use [`return_book`](Self::return_book)
    /// to close a loan.
    pub async fn delete(&self, id: i64) -> DbResult<Transaction> {
        let loan = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))?;

        if delete_where(&self.pool, Transaction::TABLE, &by_id(id)).await? == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(loan)
    }

    /// Lists loans, optionally searching by book id and member id.
    pub async fn list(&self, page: &PageRequest) -> DbResult<PageResponse<Transaction>> {
        validate_page_request(page, self.max_page_limit)?;
        fetch_page(&self.pool, Transaction::TABLE, &search_filter(page, SEARCH_COLUMNS), page).await
    }

    /// Outstanding loans due back on `date`.
    pub async fn due_on(&self, date: NaiveDate) -> DbResult<Vec<Transaction>> {
        let filter = WhereExpression::from(
            SimpleWhereExpression::new()
                .with("due_date", Condition::equals(date))
                .with("status", outstanding()),
        );
        let query = generate_select_sql(Transaction::TABLE, &filter, &[], None, None)?;
        executor::fetch_all(&self.pool, &query).await
    }

    /// Flags every `Issued` loan due before `today` as `OverDue`.
    ///
    /// ## Returns
    /// The number of loans flagged.
    pub async fn mark_overdue(&self, today: NaiveDate) -> DbResult<u64> {
        let filter = WhereExpression::from(
            SimpleWhereExpression::new()
                .with("status", Condition::equals(TransactionStatus::Issued))
                .with("due_date", Condition::lesser_than(today)),
        );
        let update = generate_update_sql(
            &ColumnSet::new().with("status", TransactionStatus::OverDue),
            Transaction::TABLE,
            &filter,
        )?;

        let flagged = executor::execute(&self.pool, &update).await?.rows_affected;
        if flagged > 0 {
            info!(flagged, %today, "Loans marked overdue");
        }
        Ok(flagged)
    }

    /// Counts loan records.
    pub async fn count(&self) -> DbResult<u64> {
        count_where(&self.pool, Transaction::TABLE, &WhereExpression::none()).await
    }

    /// Counts loans where the book is still out.
    pub async fn count_outstanding(&self) -> DbResult<u64> {
        count_where(&self.pool, Transaction::TABLE, &WhereExpression::field("status", outstanding())).await
    }

    /// Deletes every loan record. Returns the number removed.
    pub async fn delete_all(&self) -> DbResult<u64> {
        delete_where(&self.pool, Transaction::TABLE, &WhereExpression::none()).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use biblio_core::{Book, NewBook, NewMember};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Database with one member and one book of `copies` copies.
    async fn setup(copies: i64) -> (Database, Member, Book) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = db
            .members()
            .create(&NewMember {
                first_name: "Asha".to_string(),
                last_name: "Rao".to_string(),
                email: "asha@example.com".to_string(),
                phone_number: "9845012345".to_string(),
            })
            .await
            .unwrap();
        let book = db
            .books()
            .create(&NewBook {
                title: "Wise and Otherwise".to_string(),
                author: "Sudha Murthy".to_string(),
                publisher: "Penguin".to_string(),
                genre: "Nonfiction".to_string(),
                isbn_no: "9780143031031".to_string(),
                pages: 240,
                total_copies: copies,
            })
            .await
            .unwrap();
        (db, member, book)
    }

    fn loan(member: &Member, book: &Book) -> NewTransaction {
        NewTransaction {
            book_id: book.id,
            member_id: member.id,
        }
    }

    #[tokio::test]
    async fn test_issue_takes_a_copy_and_sets_due_date() {
        let (db, member, book) = setup(2).await;

        let issued = db
            .transactions()
            .issue(loan(&member, &book), date(2024, 1, 28))
            .await
            .unwrap();
        assert_eq!(issued.status, TransactionStatus::Issued);
        assert_eq!(issued.due_days, 7);
        assert_eq!(issued.due_date, date(2024, 2, 4));
        assert_eq!(issued.return_date, None);

        let book = db.books().get_by_id(book.id).await.unwrap().unwrap();
        assert_eq!(book.available_copies, 1);
    }

    #[tokio::test]
    async fn test_issue_uses_configured_loan_period() {
        let (db, member, book) = setup(1).await;
        let db = db.with_loan_period(14);

        let issued = db
            .transactions()
            .issue(loan(&member, &book), date(2024, 1, 1))
            .await
            .unwrap();
        assert_eq!(issued.due_date, date(2024, 1, 15));
    }

    #[tokio::test]
    async fn test_issue_rejects_oversized_loan_period_and_writes_nothing() {
        let (db, member, book) = setup(1).await;
        let db = db.with_loan_period(200_000_000);
        let repo = db.transactions();

        let err = repo.issue(loan(&member, &book), date(2024, 1, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::Query(_)));

        assert_eq!(repo.count().await.unwrap(), 0);
        assert_eq!(db.books().get_by_id(book.id).await.unwrap().unwrap().available_copies, 1);
    }

    #[tokio::test]
    async fn test_issue_fails_without_copies_and_writes_nothing() {
        let (db, member, book) = setup(1).await;
        let repo = db.transactions();

        repo.issue(loan(&member, &book), date(2024, 1, 1)).await.unwrap();
        let err = repo.issue(loan(&member, &book), date(2024, 1, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(db.books().get_by_id(book.id).await.unwrap().unwrap().available_copies, 0);
    }

    #[tokio::test]
    async fn test_issue_to_unknown_member_rolls_back() {
        let (db, member, book) = setup(1).await;
        let ghost = Member { id: member.id + 100, ..member };

        let err = db
            .transactions()
            .issue(loan(&ghost, &book), date(2024, 1, 1))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(db.books().get_by_id(book.id).await.unwrap().unwrap().available_copies, 1);
    }

    #[tokio::test]
    async fn test_return_puts_the_copy_back_once() {
        let (db, member, book) = setup(1).await;
        let repo = db.transactions();
        let issued = repo.issue(loan(&member, &book), date(2024, 1, 1)).await.unwrap();

        let returned = repo.return_book(issued.id, date(2024, 1, 5)).await.unwrap();
        assert_eq!(returned.status, TransactionStatus::Returned);
        assert_eq!(returned.return_date, Some(date(2024, 1, 5)));
        assert_eq!(repo.get_by_id(issued.id).await.unwrap(), Some(returned));
        assert_eq!(db.books().get_by_id(book.id).await.unwrap().unwrap().available_copies, 1);

        let err = repo.return_book(issued.id, date(2024, 1, 6)).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        assert!(repo.return_book(999, date(2024, 1, 6)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_overdue_and_due_on() {
        let (db, member, book) = setup(3).await;
        let repo = db.transactions();
        let early = repo.issue(loan(&member, &book), date(2024, 1, 1)).await.unwrap();
        let late = repo.issue(loan(&member, &book), date(2024, 1, 10)).await.unwrap();

        let due = repo.due_on(date(2024, 1, 8)).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, early.id);

        assert_eq!(repo.mark_overdue(date(2024, 1, 9)).await.unwrap(), 1);
        assert_eq!(repo.get_by_id(early.id).await.unwrap().unwrap().status, TransactionStatus::OverDue);
        assert_eq!(repo.get_by_id(late.id).await.unwrap().unwrap().status, TransactionStatus::Issued);
        assert_eq!(repo.mark_overdue(date(2024, 1, 9)).await.unwrap(), 0);

        // Overdue loans can still be returned
        repo.return_book(early.id, date(2024, 1, 12)).await.unwrap();
        assert_eq!(repo.count_outstanding().await.unwrap(), 1);
        assert!(repo.due_on(date(2024, 1, 8)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_members_with_active_loans() {
        let (db, member, book) = setup(1).await;
        db.members()
            .create(&NewMember {
                first_name: "Ravi".to_string(),
                last_name: "Kumar".to_string(),
                email: "ravi@example.com".to_string(),
                phone_number: "9000000002".to_string(),
            })
            .await
            .unwrap();

        let issued = db.transactions().issue(loan(&member, &book), date(2024, 1, 1)).await.unwrap();
        let borrowers = db.members().with_active_loans().await.unwrap();
        assert_eq!(borrowers, vec![member]);

        db.transactions().return_book(issued.id, date(2024, 1, 2)).await.unwrap();
        assert!(db.members().with_active_loans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_search_and_delete() {
        let (db, member, book) = setup(2).await;
        let repo = db.transactions();
        let issued = repo.issue(loan(&member, &book), date(2024, 1, 1)).await.unwrap();

        let page = repo
            .list(&PageRequest::new(10, 0).search(book.id.to_string()))
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);

        // Loans keep their book alive
        assert!(matches!(
            db.books().delete(book.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));

        assert_eq!(repo.delete(issued.id).await.unwrap(), issued);
        assert_eq!(repo.delete_all().await.unwrap(), 0);
    }
}

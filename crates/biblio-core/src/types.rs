//! # Domain Types
//!
//! Core domain types used throughout Biblio.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │     Member      │   │   Transaction   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  isbn_no        │   │  email (unique) │   │  book_id (FK)   │       │
//! │  │  total_copies   │   │  phone_number   │   │  member_id (FK) │       │
//! │  │  available_...  │   │                 │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  NewX      → INSERT column set (every column)                          │
//! │  XUpdate   → UPDATE column set (only the fields that are Some)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::query::{ColumnData, ColumnSet, ToColumnSet};
use crate::validation::validate_loan_period;

// =============================================================================
// Book
// =============================================================================

/// A book in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub genre: String,
    /// 13-digit ISBN.
    pub isbn_no: String,
    pub pages: i64,
    pub total_copies: i64,
    /// Copies currently on the shelf (not issued).
    pub available_copies: i64,
}

impl Book {
    pub const TABLE: &'static str = "books";

    /// Checks if at least one copy can be issued.
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Fields supplied when adding a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub genre: String,
    pub isbn_no: String,
    pub pages: i64,
    pub total_copies: i64,
}

/// A new book starts with every copy available.
impl ToColumnSet for NewBook {
    fn to_column_set(&self) -> ColumnSet {
        ColumnSet::new()
            .with("title", &self.title)
            .with("author", &self.author)
            .with("publisher", &self.publisher)
            .with("genre", &self.genre)
            .with("isbn_no", &self.isbn_no)
            .with("pages", self.pages)
            .with("total_copies", self.total_copies)
            .with("available_copies", self.total_copies)
    }
}

/// Partial book update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub isbn_no: Option<String>,
    pub pages: Option<i64>,
}

impl ToColumnSet for BookUpdate {
    fn to_column_set(&self) -> ColumnSet {
        ColumnSet::new()
            .with_some("title", self.title.as_ref())
            .with_some("author", self.author.as_ref())
            .with_some("publisher", self.publisher.as_ref())
            .with_some("genre", self.genre.as_ref())
            .with_some("isbn_no", self.isbn_no.as_ref())
            .with_some("pages", self.pages)
    }
}

// =============================================================================
// Member
// =============================================================================

/// A registered library member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl Member {
    pub const TABLE: &'static str = "members";

    /// Display name: "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields supplied when registering a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl ToColumnSet for NewMember {
    fn to_column_set(&self) -> ColumnSet {
        ColumnSet::new()
            .with("first_name", &self.first_name)
            .with("last_name", &self.last_name)
            .with("email", &self.email)
            .with("phone_number", &self.phone_number)
    }
}

/// Partial member update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MemberUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl ToColumnSet for MemberUpdate {
    fn to_column_set(&self) -> ColumnSet {
        ColumnSet::new()
            .with_some("first_name", self.first_name.as_ref())
            .with_some("last_name", self.last_name.as_ref())
            .with_some("email", self.email.as_ref())
            .with_some("phone_number", self.phone_number.as_ref())
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// The state of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum TransactionStatus {
    /// Book is with the member.
    Issued,
    /// Book is back on the shelf.
    Returned,
    /// Book is with the member past its due date.
    OverDue,
}

impl TransactionStatus {
    /// Stored text value.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Issued => "Issued",
            TransactionStatus::Returned => "Returned",
            TransactionStatus::OverDue => "OverDue",
        }
    }

    /// Returns true while the book is still out.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, TransactionStatus::Issued | TransactionStatus::OverDue)
    }
}

impl From<TransactionStatus> for ColumnData {
    fn from(status: TransactionStatus) -> Self {
        ColumnData::Text(status.as_str().to_string())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A book loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    pub due_days: i64,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub return_date: Option<NaiveDate>,
    pub status: TransactionStatus,
}

impl Transaction {
    pub const TABLE: &'static str = "transactions";

    /// Checks if the loan is outstanding past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_outstanding() && self.due_date < today
    }
}

/// Book + member pair supplied when issuing a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransaction {
    pub book_id: i64,
    pub member_id: i64,
}

impl NewTransaction {
    /// Column set for a loan issued on `issue_date` for `due_days` days.
    ///
    /// ## Returns
    /// * `Err(CoreError::Validation)` - `due_days` is outside the accepted
    ///   loan period, or the due date falls past the last representable date
    pub fn issue_columns(&self, issue_date: NaiveDate, due_days: i64) -> CoreResult<ColumnSet> {
        validate_loan_period(due_days)?;

        let due_date = u64::try_from(due_days)
            .ok()
            .and_then(|days| issue_date.checked_add_days(Days::new(days)))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "due_date".to_string(),
                reason: format!("{issue_date} + {due_days} days is not a valid date"),
            })?;

        Ok(ColumnSet::new()
            .with("book_id", self.book_id)
            .with("member_id", self.member_id)
            .with("issue_date", issue_date)
            .with("due_days", due_days)
            .with("due_date", due_date)
            .with("return_date", ColumnData::Null)
            .with("status", TransactionStatus::Issued))
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// A page of a listing, optionally filtered by a free-text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
    pub search: Option<String>,
}

impl PageRequest {
    pub fn new(limit: u64, offset: u64) -> Self {
        PageRequest {
            limit,
            offset,
            search: None,
        }
    }

    /// Sets the search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Search term, if any non-blank term was supplied.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Where a page sits in the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
    /// Rows matching the filter, ignoring limit/offset.
    pub total: u64,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

// =============================================================================
// Unit Tests
// =============================================================================

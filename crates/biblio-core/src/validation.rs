//! # Validation Module
//!
//! Input validation for books, members and listing requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE                                                  │
//! │  ├── Field formats (ISBN digits, phone digits, email shape)            │
//! │  └── Lengths and numeric ranges                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Query generator                                              │
//! │  └── Every value travels as a bound parameter                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (members.email)                                            │
//! │  └── Foreign keys (transactions → books, members)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use biblio_core::validation::{validate_isbn, validate_phone_number};
//!
//! assert!(validate_isbn("9780143031031").is_ok());
//! assert!(validate_phone_number("98450").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{BookUpdate, MemberUpdate, NewBook, NewMember, PageRequest};
use crate::MAX_LOAN_PERIOD_DAYS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted free-text search term.
pub const MAX_SEARCH_LENGTH: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

fn only(field: &str, value: &str, allowed: impl Fn(char) -> bool, reason: &str) -> ValidationResult<()> {
    if !value.trim().chars().all(allowed) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        });
    }
    Ok(())
}

/// Validates a book title: 1-30 letters, digits and spaces.
pub fn validate_title(title: &str) -> ValidationResult<()> {
    required("title", title, 30)?;
    only(
        "title",
        title,
        |c| c.is_alphanumeric() || c == ' ',
        "must contain only letters, numbers, and spaces",
    )
}

/// Validates an author name: 1-30 letters and spaces.
pub fn validate_author(author: &str) -> ValidationResult<()> {
    required("author", author, 30)?;
    only(
        "author",
        author,
        |c| c.is_alphabetic() || c == ' ',
        "must contain only letters and spaces",
    )
}

/// Validates a publisher name: 1-30 characters.
pub fn validate_publisher(publisher: &str) -> ValidationResult<()> {
    required("publisher", publisher, 30)
}

/// Validates a genre: 1-20 letters and spaces.
pub fn validate_genre(genre: &str) -> ValidationResult<()> {
    required("genre", genre, 20)?;
    only(
        "genre",
        genre,
        |c| c.is_alphabetic() || c == ' ',
        "must contain only letters and spaces",
    )
}

/// Validates an ISBN: exactly 13 digits.
///
/// ## Example
/// ```rust
/// use biblio_core::validation::validate_isbn;
///
/// assert!(validate_isbn("9780143031031").is_ok());
/// assert!(validate_isbn("978-0143031031").is_err());
/// ```
pub fn validate_isbn(isbn: &str) -> ValidationResult<()> {
    if isbn.len() != 13 || !isbn.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "isbn_no".to_string(),
            reason: "must be exactly 13 digits".to_string(),
        });
    }
    Ok(())
}

/// Validates a member name part (first or last): 1-50 characters.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name, 50)
}

/// Validates an email address: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("email", email, 255)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || !domain.contains('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(())
}

/// Validates a phone number: exactly 10 digits.
pub fn validate_phone_number(phone: &str) -> ValidationResult<()> {
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone_number".to_string(),
            reason: "must be exactly 10 digits".to_string(),
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LENGTH,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn in_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// Validates a page count (at least 1).
pub fn validate_pages(pages: i64) -> ValidationResult<()> {
    in_range("pages", pages, 1, i64::from(i32::MAX))
}

/// Validates a copy count (zero allowed).
pub fn validate_total_copies(copies: i64) -> ValidationResult<()> {
    in_range("total_copies", copies, 0, i64::from(i32::MAX))
}

/// Validates a loan period: 1 to [`MAX_LOAN_PERIOD_DAYS`] days.
pub fn validate_loan_period(days: i64) -> ValidationResult<()> {
    in_range("due_days", days, 1, MAX_LOAN_PERIOD_DAYS)
}

/// Validates a page request against the configured maximum page size.
pub fn validate_page_request(page: &PageRequest, max_limit: u64) -> ValidationResult<()> {
    if page.limit == 0 || page.limit > max_limit {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: i64::try_from(max_limit).unwrap_or(i64::MAX),
        });
    }
    if let Some(search) = &page.search {
        validate_search_query(search)?;
    }
    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates every field of a new book.
pub fn validate_new_book(book: &NewBook) -> ValidationResult<()> {
    validate_title(&book.title)?;
    validate_author(&book.author)?;
    validate_publisher(&book.publisher)?;
    validate_genre(&book.genre)?;
    validate_isbn(&book.isbn_no)?;
    validate_pages(book.pages)?;
    validate_total_copies(book.total_copies)
}

/// Validates the fields present in a book update.
pub fn validate_book_update(update: &BookUpdate) -> ValidationResult<()> {
    if let Some(title) = &update.title {
        validate_title(title)?;
    }
    if let Some(author) = &update.author {
        validate_author(author)?;
    }
    if let Some(publisher) = &update.publisher {
        validate_publisher(publisher)?;
    }
    if let Some(genre) = &update.genre {
        validate_genre(genre)?;
    }
    if let Some(isbn) = &update.isbn_no {
        validate_isbn(isbn)?;
    }
    if let Some(pages) = update.pages {
        validate_pages(pages)?;
    }
    Ok(())
}

/// Validates every field of a new member.
pub fn validate_new_member(member: &NewMember) -> ValidationResult<()> {
    validate_name("first_name", &member.first_name)?;
    validate_name("last_name", &member.last_name)?;
    validate_email(&member.email)?;
    validate_phone_number(&member.phone_number)
}

/// Validates the fields present in a member update.
pub fn validate_member_update(update: &MemberUpdate) -> ValidationResult<()> {
    if let Some(first_name) = &update.first_name {
        validate_name("first_name", first_name)?;
    }
    if let Some(last_name) = &update.last_name {
        validate_name("last_name", last_name)?;
    }
    if let Some(email) = &update.email {
        validate_email(email)?;
    }
    if let Some(phone) = &update.phone_number {
        validate_phone_number(phone)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

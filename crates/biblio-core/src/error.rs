//! # Error Types
//!
//! Domain-specific error types for biblio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  biblio-core errors (this file)                                        │
//! │  ├── CoreError        - Ill-formed expressions / column sets           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  biblio-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The query generator never returns a partial statement: any problem in the
//! input tree is reported as a [`CoreError`] at call time.

use thiserror::Error;

use crate::query::Operator;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while turning where-expressions and column sets into SQL.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The expression tree cannot be compiled.
    ///
    /// ## When This Occurs
    /// - An `IN` / `NOT_IN` list with no elements
    /// - A nested query that selects no column
    /// - A field with an empty name
    #[error("Malformed expression on `{field}`: {reason}")]
    MalformedExpression { field: String, reason: String },

    /// The operator cannot be applied to the shape of the value.
    ///
    /// ## When This Occurs
    /// ```text
    /// IN / NOT_IN        + scalar or null   → mismatch (needs a list)
    /// EQUALS, LIKE, ...  + list             → mismatch (needs a scalar)
    /// CONTAINS, >, ...   + null             → mismatch (only = / != take null)
    /// ```
    #[error("Operator {op} cannot be used with a {shape} value on `{field}`")]
    OperatorValueMismatch {
        field: String,
        op: Operator,
        shape: &'static str,
    },

    /// INSERT or UPDATE was asked to write zero columns.
    #[error("{statement} on `{table}` needs at least one column")]
    EmptyColumnSet {
        statement: &'static str,
        table: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a MalformedExpression error for the given field.
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::MalformedExpression {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any statement is generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., ISBN with letters, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

//! # biblio-core: Query Generation for Biblio
//!
//! This crate is the **heart** of Biblio. It turns typed filter trees and
//! column sets into parameterized SQL, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Biblio Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (HTTP API, CLI, seed tool)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                biblio-db (Repositories, Executor)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ WhereExpression, ColumnSet             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ biblio-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │expression │  │ compiler  │  │ statement │  │   types   │  │   │
//! │  │   │ AND / OR  │─►│ WHERE ..  │◄─│ INSERT .. │  │ Book      │  │   │
//! │  │   │ leaves    │  │ + params  │  │ SELECT .. │  │ Member    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`query`] - Where-expressions, the where-clause compiler, statement builders
//! - [`types`] - Domain types (Book, Member, Transaction, pagination)
//! - [`error`] - Query and validation error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use biblio_core::query::{generate_select_sql, Condition, WhereExpression};
//!
//! let filter = WhereExpression::field("genre", Condition::equals("Computers"));
//! let query = generate_select_sql("books", &filter, &[], Some(1), Some(10)).unwrap();
//!
//! assert_eq!(query.sql, "SELECT * FROM `books` WHERE (`genre` = ?) LIMIT 10 OFFSET 1");
//! assert_eq!(query.data.len(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod query;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use query::{ColumnData, ColumnSet, Condition, Query, ToColumnSet, WhereExpression};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default loan period in days.
pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 7;

/// Longest loan period accepted, in days (ten years).
pub const MAX_LOAN_PERIOD_DAYS: i64 = 3650;

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

/// Largest page a listing may request.
pub const MAX_PAGE_LIMIT: u64 = 100;

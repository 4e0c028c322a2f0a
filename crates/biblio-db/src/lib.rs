//! # biblio-db: Database Layer for Biblio
//!
//! This crate runs the SQL generated by `biblio-core` against SQLite, with
//! sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Biblio Data Flow                               │
//! │                                                                         │
//! │  Caller (API handler, seed tool)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     biblio-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BookRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ MemberRepo    │    │ 001_init.sql │  │   │
//! │  │   │ AppConfig     │    │TransactionRepo│    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ Query { sql, data }          │   │
//! │  │                        ┌───────▼───────┐                      │   │
//! │  │                        │   executor    │ binds data, runs sql │   │
//! │  │                        └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (biblio.db)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - TOML + environment configuration
//! - [`executor`] - Binding and running generated queries
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Book, member and loan repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use biblio_db::{AppConfig, Database};
//!
//! let config = AppConfig::load(Some(Path::new("biblio.toml")))?;
//! let db = Database::open(&config).await?;
//!
//! let page = db.books().list(&config.pagination.request(None, 0)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod executor;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use executor::ExecOutcome;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::book::BookRepository;
pub use repository::member::MemberRepository;
pub use repository::transaction::TransactionRepository;

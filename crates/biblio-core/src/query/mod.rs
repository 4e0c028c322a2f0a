//! # Query Generation
//!
//! Turns where-expressions and column sets into parameterized SQL.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Repository builds WhereExpression + ColumnSet                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  statement::generate_*_sql(table, ..)                                  │
//! │       │                                                                 │
//! │       ├──► compiler::generate_where_clause_sql(filter)                 │
//! │       │         │                                                       │
//! │       │         └──► IN list nested query ──► generate_select_sql      │
//! │       ▼                                                                 │
//! │  Query { sql: "... WHERE (`genre` = ?)", data: ["Computers"] }         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  biblio-db executor binds data positionally and runs it                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure: no I/O, no shared state, safe to call from any
//! thread.

pub mod compiler;
pub mod expression;
pub mod statement;
pub mod value;

pub use compiler::{generate_where_clause_sql, quote_identifier};
pub use expression::{
    ColumnSet, Condition, ListItem, NestedQuery, Operator, SimpleWhereExpression, ToColumnSet, WhereExpression,
    WhereValue,
};
pub use statement::{
    count_result_key, generate_count_sql, generate_delete_sql, generate_insert_sql, generate_select_sql,
    generate_update_sql,
};
pub use value::{ColumnData, Query};

//! # Member Repository
//!
//! Database operations for library members.

use biblio_core::query::{
    generate_insert_sql, generate_select_sql, generate_update_sql, Condition, ListItem, NestedQuery, ToColumnSet,
    WhereExpression,
};
use biblio_core::validation::{validate_email, validate_member_update, validate_new_member, validate_page_request};
use biblio_core::{
    Member, MemberUpdate, NewMember, PageRequest, PageResponse, Transaction, TransactionStatus, MAX_PAGE_LIMIT,
};
use sqlx::SqlitePool;
use tracing::debug;

use super::{by_id, count_where, delete_where, fetch_page, find_one, search_filter};
use crate::error::{DbError, DbResult};
use crate::executor;

/// Columns a free-text member search looks at.
const SEARCH_COLUMNS: &[&str] = &["first_name", "last_name", "phone_number"];

/// Repository for member database operations.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
    max_page_limit: u64,
}

impl MemberRepository {
    /// Creates a new MemberRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository {
            pool,
            max_page_limit: MAX_PAGE_LIMIT,
        }
    }

    /// Sets the largest page [`list`](Self::list) will serve.
    pub fn max_page_limit(mut self, max: u64) -> Self {
        self.max_page_limit = max;
        self
    }

    /// Registers a member.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - The email is already registered
    pub async fn create(&self, member: &NewMember) -> DbResult<Member> {
        validate_new_member(member)?;
        debug!(email = %member.email, "Inserting member");

        let query = generate_insert_sql(Member::TABLE, &member.to_column_set())?;
        let outcome = executor::execute(&self.pool, &query)
            .await
            .map_err(|e| duplicate_email(e, &member.email))?;

        self.get_by_id(outcome.last_insert_id)
            .await?
            .ok_or_else(|| DbError::not_found("Member", outcome.last_insert_id))
    }

    /// Gets a member by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Member>> {
        find_one(&self.pool, Member::TABLE, &by_id(id)).await
    }

    /// Gets a member by email address.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Member>> {
        validate_email(email)?;
        find_one(&self.pool, Member::TABLE, &WhereExpression::field("email", Condition::equals(email.trim()))).await
    }

    /// Applies a partial update and returns the updated member.
    pub async fn update(&self, id: i64, update: &MemberUpdate) -> DbResult<Member> {
        validate_member_update(update)?;
        debug!(id, "Updating member");

        let query = generate_update_sql(&update.to_column_set(), Member::TABLE, &by_id(id))?;
        let outcome = executor::execute(&self.pool, &query).await.map_err(|e| match &update.email {
            Some(email) => duplicate_email(e, email),
            None => e,
        })?;
        if outcome.rows_affected == 0 {
            return Err(DbError::not_found("Member", id));
        }

        self.get_by_id(id).await?.ok_or_else(|| DbError::not_found("Member", id))
    }

    /// Deletes a member and returns what was deleted.
    pub async fn delete(&self, id: i64) -> DbResult<Member> {
        let member = self.get_by_id(id).await?.ok_or_else(|| DbError::not_found("Member", id))?;

        debug!(id, "Deleting member");
        if delete_where(&self.pool, Member::TABLE, &by_id(id)).await? == 0 {
            return Err(DbError::not_found("Member", id));
        }

        Ok(member)
    }

    /// Lists members, optionally searching first name, last name and phone.
    pub async fn list(&self, page: &PageRequest) -> DbResult<PageResponse<Member>> {
        validate_page_request(page, self.max_page_limit)?;
        fetch_page(&self.pool, Member::TABLE, &search_filter(page, SEARCH_COLUMNS), page).await
    }

    /// Members holding at least one book right now.
    ///
    /// Runs as a single statement:
    /// ```sql
    /// SELECT * FROM `members`
    /// WHERE (`id` IN (SELECT `member_id` FROM `transactions` WHERE (`status` IN (?, ?))))
    /// ```
    pub async fn with_active_loans(&self) -> DbResult<Vec<Member>> {
        let outstanding = WhereExpression::field(
            "status",
            Condition::in_list([
                ListItem::value(TransactionStatus::Issued),
                ListItem::value(TransactionStatus::OverDue),
            ]),
        );
        let borrowers = NestedQuery::new(Transaction::TABLE, ["member_id"], outstanding);
        let filter = WhereExpression::field("id", Condition::in_list([borrowers]));

        let query = generate_select_sql(Member::TABLE, &filter, &[], None, None)?;
        executor::fetch_all(&self.pool, &query).await
    }

    /// Counts registered members.
    pub async fn count(&self) -> DbResult<u64> {
        count_where(&self.pool, Member::TABLE, &WhereExpression::none()).await
    }

    /// Deletes every member. Returns the number removed.
    pub async fn delete_all(&self) -> DbResult<u64> {
        delete_where(&self.pool, Member::TABLE, &WhereExpression::none()).await
    }
}

/// Names the offending email in a unique violation.
fn duplicate_email(err: DbError, email: &str) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => DbError::duplicate("email", email),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

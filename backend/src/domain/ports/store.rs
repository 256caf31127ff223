//! Driven port for transactional persistence.
//!
//! A [`Store`] hands out [`UnitOfWork`] values, each owning one open
//! transaction. Writes only happen through a unit of work; the store itself
//! offers non-transactional reads for callers that need no isolation across
//! calls.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio::time::Instant;
use tracing::warn;

use crate::domain::{
    Account, AccountFilter, AccountId, AccountUpdate, EmailToken, Listing, ListingFilter,
    ListingId, ListingUpdate,
};

use super::define_port_error;

define_port_error! {
    /// Failures surfaced by store adapters.
    pub enum StoreError {
        /// The target row does not exist.
        NotFound => "record not found",
        /// A unique key is already taken, or the identifier is unusable.
        AlreadyExists => "record already exists",
        /// No connection could be obtained or the connection broke.
        Connection { message: String } => "store connection failed: {message}",
        /// The engine rejected or failed the statement.
        Query { message: String } => "store query failed: {message}",
        /// The caller's deadline elapsed before the operation finished.
        Cancelled => "store operation cancelled: deadline elapsed",
        /// The statement could not be assembled.
        InvalidStatement { message: String } => "statement construction failed: {message}",
    }
}

/// Caller-supplied bound on how long a store operation may run.
///
/// When the deadline elapses the in-flight future is dropped, which aborts
/// the statement, and [`StoreError::Cancelled`] is returned.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use hestia::domain::ports::{Deadline, StoreError};
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let slow = async {
///     tokio::time::sleep(Duration::from_secs(5)).await;
///     Ok::<_, StoreError>(())
/// };
/// let result = Deadline::after(Duration::from_millis(1)).run(slow).await;
/// assert_eq!(result, Err(StoreError::Cancelled));
/// # });
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No bound.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Expire `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    /// Drive `fut` to completion or until the deadline elapses.
    pub async fn run<T, F>(self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match self.0 {
            None => fut.await,
            Some(at) => tokio::time::timeout_at(at, fut)
                .await
                .unwrap_or(Err(StoreError::Cancelled)),
        }
    }
}

/// Entry point to persistence.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction bound by `deadline` for its whole lifetime.
    async fn begin(&self, deadline: Deadline) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Accounts matching `filter`, ordered by identifier.
    async fn find_accounts(
        &self,
        filter: &AccountFilter,
        deadline: Deadline,
    ) -> Result<Vec<Account>, StoreError>;

    /// Listings matching `filter`, ordered by identifier.
    async fn find_listings(
        &self,
        filter: &ListingFilter,
        deadline: Deadline,
    ) -> Result<Vec<Listing>, StoreError>;

    /// One listing by identifier, or [`StoreError::NotFound`].
    async fn get_listing(&self, id: &ListingId, deadline: Deadline)
    -> Result<Listing, StoreError>;
}

/// One open transaction.
///
/// Exactly one of [`UnitOfWork::commit`] or [`UnitOfWork::rollback`] consumes
/// the value. Dropping it without either discards all writes.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Apply every write made through this unit.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write made through this unit. Adapters must still
    /// reach the engine when the unit's deadline has already elapsed.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;

    /// Insert an account. Empty or duplicate keys yield `AlreadyExists`.
    async fn create_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Apply the `Some` fields of `update` and set `updated_at = now`.
    async fn update_account(
        &mut self,
        id: &AccountId,
        update: &AccountUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Remove an account.
    async fn delete_account(&mut self, id: &AccountId) -> Result<(), StoreError>;

    /// Accounts matching `filter`, seen through this transaction.
    async fn find_accounts(&mut self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError>;

    /// Insert a listing.
    async fn create_listing(&mut self, listing: &Listing) -> Result<(), StoreError>;

    /// Apply the `Some` fields of `update` and set `updated_at = now`.
    async fn update_listing(
        &mut self,
        id: &ListingId,
        update: &ListingUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Remove a listing.
    async fn delete_listing(&mut self, id: &ListingId) -> Result<(), StoreError>;

    /// Listings matching `filter`, seen through this transaction.
    async fn find_listings(&mut self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError>;

    /// Persist a freshly minted email token.
    async fn create_email_token(&mut self, token: &EmailToken) -> Result<(), StoreError>;

    /// The token with `id`, or [`StoreError::NotFound`].
    async fn find_email_token(&mut self, id: &str) -> Result<EmailToken, StoreError>;

    /// Stamp `consumed_at` on an unconsumed token.
    async fn consume_email_token(
        &mut self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Run `work` inside a fresh unit of work.
///
/// Commits when `work` succeeds. On failure the unit is rolled back
/// explicitly; a rollback failure is logged and the original error returned.
///
/// `work` receives the unit by mutable reference and must only capture
/// owned data, since the returned future borrows the unit alone.
///
/// # Errors
/// Whatever `work` returns, or the store error from `begin`/`commit`.
pub async fn in_unit_of_work<T, E, F>(store: &dyn Store, deadline: Deadline, work: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a mut Box<dyn UnitOfWork>) -> BoxFuture<'a, Result<T, E>>,
    E: From<StoreError> + std::fmt::Display,
{
    let mut unit = store.begin(deadline).await?;
    match work(&mut unit).await {
        Ok(value) => {
            unit.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = unit.rollback().await {
                warn!(error = %err, rollback_error = %rollback_err, "rollback after failed unit of work failed");
            }
            Err(err)
        }
    }
}

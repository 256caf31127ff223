//! PostgreSQL adapters for the [`Store`] and [`UnitOfWork`] ports.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use tracing::debug;

use crate::domain::ports::{Deadline, Store, StoreError, UnitOfWork};
use crate::domain::{
    Account, AccountFilter, AccountId, AccountUpdate, EmailToken, Listing, ListingFilter,
    ListingId, ListingUpdate,
};

use super::error_mapping::map_sqlx_error;
use super::pool::DbPool;
use super::{accounts, email_tokens, listings};

/// Bound on an explicit rollback. The unit's own deadline may already have
/// elapsed when the rollback is issued.
const ROLLBACK_GRACE: Duration = Duration::from_secs(5);

/// [`Store`] backed by a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    /// Serve the store from `pool`.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self, deadline: Deadline) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = deadline
            .run(async { self.pool.inner().begin().await.map_err(map_sqlx_error) })
            .await?;
        debug!("transaction opened");
        Ok(Box::new(PgUnitOfWork { tx, deadline }))
    }

    async fn find_accounts(
        &self,
        filter: &AccountFilter,
        deadline: Deadline,
    ) -> Result<Vec<Account>, StoreError> {
        let mut pool = self.pool.clone();
        deadline.run(accounts::find(&mut pool, filter)).await
    }

    async fn find_listings(
        &self,
        filter: &ListingFilter,
        deadline: Deadline,
    ) -> Result<Vec<Listing>, StoreError> {
        let mut pool = self.pool.clone();
        deadline.run(listings::find(&mut pool, filter)).await
    }

    async fn get_listing(&self, id: &ListingId, deadline: Deadline) -> Result<Listing, StoreError> {
        let mut pool = self.pool.clone();
        deadline.run(listings::get(&mut pool, id)).await
    }
}

/// One open PostgreSQL transaction.
///
/// Dropping the value without committing lets `sqlx` roll the transaction
/// back when the connection returns to the pool.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
    deadline: Deadline,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { tx, deadline } = *self;
        deadline
            .run(async { tx.commit().await.map_err(map_sqlx_error) })
            .await?;
        debug!("transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let Self { tx, .. } = *self;
        Deadline::after(ROLLBACK_GRACE)
            .run(async { tx.rollback().await.map_err(map_sqlx_error) })
            .await?;
        debug!("transaction rolled back");
        Ok(())
    }

    async fn create_account(&mut self, account: &Account) -> Result<(), StoreError> {
        self.deadline.run(accounts::create(&mut self.tx, account)).await
    }

    async fn update_account(
        &mut self,
        id: &AccountId,
        update: &AccountUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.deadline
            .run(accounts::update(&mut self.tx, id, update, now))
            .await
    }

    async fn delete_account(&mut self, id: &AccountId) -> Result<(), StoreError> {
        self.deadline.run(accounts::delete(&mut self.tx, id)).await
    }

    async fn find_accounts(&mut self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError> {
        self.deadline.run(accounts::find(&mut self.tx, filter)).await
    }

    async fn create_listing(&mut self, listing: &Listing) -> Result<(), StoreError> {
        self.deadline.run(listings::create(&mut self.tx, listing)).await
    }

    async fn update_listing(
        &mut self,
        id: &ListingId,
        update: &ListingUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.deadline
            .run(listings::update(&mut self.tx, id, update, now))
            .await
    }

    async fn delete_listing(&mut self, id: &ListingId) -> Result<(), StoreError> {
        self.deadline.run(listings::delete(&mut self.tx, id)).await
    }

    async fn find_listings(&mut self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError> {
        self.deadline.run(listings::find(&mut self.tx, filter)).await
    }

    async fn create_email_token(&mut self, token: &EmailToken) -> Result<(), StoreError> {
        self.deadline.run(email_tokens::create(&mut self.tx, token)).await
    }

    async fn find_email_token(&mut self, id: &str) -> Result<EmailToken, StoreError> {
        self.deadline.run(email_tokens::find(&mut self.tx, id)).await
    }

    async fn consume_email_token(
        &mut self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.deadline
            .run(email_tokens::consume(&mut self.tx, id, at))
            .await
    }
}

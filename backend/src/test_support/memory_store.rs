//! In-memory [`Store`] for service and handler tests.
//!
//! A unit of work copies the committed state on `begin` and writes it back on
//! `commit`, so uncommitted writes are invisible and rollbacks are free. The
//! uniqueness, empty-identifier and missing-row rules match the PostgreSQL
//! adapter.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{Deadline, Store, StoreError, UnitOfWork};
use crate::domain::{
    Account, AccountFilter, AccountId, AccountUpdate, EmailToken, Listing, ListingFilter,
    ListingId, ListingUpdate,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: BTreeMap<String, Account>,
    listings: BTreeMap<String, Listing>,
    email_tokens: BTreeMap<String, EmailToken>,
}

#[derive(Debug, Default)]
struct Shared {
    committed: Mutex<Tables>,
    unavailable: AtomicBool,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.committed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Make every subsequent `begin` and read fail with `Connection`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seed an account directly, bypassing uniqueness checks.
    pub fn insert_account(&self, account: Account) {
        self.shared
            .lock()
            .accounts
            .insert(account.id.as_str().to_owned(), account);
    }

    /// Committed account by identifier.
    #[must_use]
    pub fn account(&self, id: &AccountId) -> Option<Account> {
        self.shared.lock().accounts.get(id.as_str()).cloned()
    }

    /// Number of committed accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.shared.lock().accounts.len()
    }

    /// Number of committed listings.
    #[must_use]
    pub fn listing_count(&self) -> usize {
        self.shared.lock().listings.len()
    }

    /// Committed email tokens, ordered by identifier.
    #[must_use]
    pub fn email_tokens(&self) -> Vec<EmailToken> {
        self.shared.lock().email_tokens.values().cloned().collect()
    }

    /// Units of work committed so far.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.shared.commits.load(Ordering::SeqCst)
    }

    /// Units of work explicitly rolled back so far.
    #[must_use]
    pub fn rollbacks(&self) -> usize {
        self.shared.rollbacks.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.shared.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::connection("memory store marked unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self, _deadline: Deadline) -> Result<Box<dyn UnitOfWork>, StoreError> {
        self.check_available()?;
        let working = self.shared.lock().clone();
        Ok(Box::new(MemoryUnitOfWork {
            shared: Arc::clone(&self.shared),
            working,
        }))
    }

    async fn find_accounts(
        &self,
        filter: &AccountFilter,
        _deadline: Deadline,
    ) -> Result<Vec<Account>, StoreError> {
        self.check_available()?;
        Ok(select_accounts(&self.shared.lock(), filter))
    }

    async fn find_listings(
        &self,
        filter: &ListingFilter,
        _deadline: Deadline,
    ) -> Result<Vec<Listing>, StoreError> {
        self.check_available()?;
        Ok(select_listings(&self.shared.lock(), filter))
    }

    async fn get_listing(&self, id: &ListingId, _deadline: Deadline) -> Result<Listing, StoreError> {
        self.check_available()?;
        self.shared
            .lock()
            .listings
            .get(id.as_str())
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

struct MemoryUnitOfWork {
    shared: Arc<Shared>,
    working: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        *self.shared.lock() = self.working;
        self.shared.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.shared.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_account(&mut self, account: &Account) -> Result<(), StoreError> {
        let taken = self.working.accounts.contains_key(account.id.as_str())
            || self
                .working
                .accounts
                .values()
                .any(|existing| existing.email == account.email);
        if account.id.is_empty() || taken {
            return Err(StoreError::AlreadyExists);
        }
        self.working
            .accounts
            .insert(account.id.as_str().to_owned(), account.clone());
        Ok(())
    }

    async fn update_account(
        &mut self,
        id: &AccountId,
        update: &AccountUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(email) = &update.email {
            let clash = self
                .working
                .accounts
                .values()
                .any(|other| other.id != *id && other.email == *email);
            if clash {
                return Err(StoreError::AlreadyExists);
            }
        }
        let account = self
            .working
            .accounts
            .get_mut(id.as_str())
            .ok_or(StoreError::NotFound)?;
        account.updated_at = now;
        if let Some(email) = &update.email {
            account.email.clone_from(email);
        }
        if let Some(role) = &update.role {
            account.role.clone_from(role);
        }
        if let Some(hash) = &update.password_hash {
            account.password_hash.clone_from(hash);
        }
        if let Some(active) = update.is_active {
            account.is_active = active;
        }
        Ok(())
    }

    async fn delete_account(&mut self, id: &AccountId) -> Result<(), StoreError> {
        self.working
            .accounts
            .remove(id.as_str())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn find_accounts(&mut self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError> {
        Ok(select_accounts(&self.working, filter))
    }

    async fn create_listing(&mut self, listing: &Listing) -> Result<(), StoreError> {
        if listing.id.is_empty() || self.working.listings.contains_key(listing.id.as_str()) {
            return Err(StoreError::AlreadyExists);
        }
        self.working
            .listings
            .insert(listing.id.as_str().to_owned(), listing.clone());
        Ok(())
    }

    async fn update_listing(
        &mut self,
        id: &ListingId,
        update: &ListingUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let listing = self
            .working
            .listings
            .get_mut(id.as_str())
            .ok_or(StoreError::NotFound)?;
        update.apply_to(&mut listing.content);
        listing.updated_at = now;
        Ok(())
    }

    async fn delete_listing(&mut self, id: &ListingId) -> Result<(), StoreError> {
        self.working
            .listings
            .remove(id.as_str())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn find_listings(&mut self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError> {
        Ok(select_listings(&self.working, filter))
    }

    async fn create_email_token(&mut self, token: &EmailToken) -> Result<(), StoreError> {
        if token.id.is_empty() || self.working.email_tokens.contains_key(&token.id) {
            return Err(StoreError::AlreadyExists);
        }
        self.working
            .email_tokens
            .insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn find_email_token(&mut self, id: &str) -> Result<EmailToken, StoreError> {
        self.working
            .email_tokens
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn consume_email_token(&mut self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        match self.working.email_tokens.get_mut(id) {
            Some(token) if token.consumed_at.is_none() => {
                token.consumed_at = Some(at);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

fn select_accounts(tables: &Tables, filter: &AccountFilter) -> Vec<Account> {
    tables
        .accounts
        .values()
        .filter(|a| filter.ids.is_empty() || filter.ids.contains(&a.id))
        .filter(|a| filter.emails.is_empty() || filter.emails.contains(&a.email))
        .filter(|a| filter.active.is_none_or(|active| a.is_active == active))
        .cloned()
        .collect()
}

fn select_listings(tables: &Tables, filter: &ListingFilter) -> Vec<Listing> {
    tables
        .listings
        .values()
        .filter(|l| filter.ids.is_empty() || filter.ids.contains(&l.id))
        .cloned()
        .collect()
}

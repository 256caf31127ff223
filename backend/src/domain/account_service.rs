//! Account use cases: registration, login and administration.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::info;

use super::ports::{Deadline, Store, StoreError, in_unit_of_work};
use super::{
    Account, AccountFilter, AccountId, AccountUpdate, Error, LoginCredentials, Password,
    Registration, TokenManager, stored_now,
};

/// Account data supplied by an administrator.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Email address; must be unused.
    pub email: String,
    /// Initial password.
    pub password: Password,
    /// Role label.
    pub role: String,
    /// Whether the account may log in straight away.
    pub is_active: bool,
}

/// Account service over the [`Store`] port.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenManager>,
    clock: Arc<dyn Clock>,
    statement_timeout: Duration,
    default_role: String,
}

impl AccountService {
    /// Create a service. Every store call is bounded by `statement_timeout`.
    pub fn new(
        store: Arc<dyn Store>,
        tokens: Arc<TokenManager>,
        clock: Arc<dyn Clock>,
        statement_timeout: Duration,
        default_role: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tokens,
            clock,
            statement_timeout,
            default_role: default_role.into(),
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.statement_timeout)
    }

    /// Create an active account with the default role.
    pub async fn register(&self, registration: &Registration) -> Result<Account, Error> {
        let account = self
            .build_account(
                registration.email(),
                registration.password(),
                &self.default_role,
                true,
            )
            .await?;
        self.insert(account).await
    }

    /// Create an account on behalf of an administrator.
    pub async fn create(&self, new_account: &NewAccount) -> Result<Account, Error> {
        let account = self
            .build_account(
                &new_account.email,
                &new_account.password,
                &new_account.role,
                new_account.is_active,
            )
            .await?;
        self.insert(account).await
    }

    /// Exchange credentials of an active account for a signed token.
    ///
    /// Unknown emails, inactive accounts and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<String, Error> {
        let filter = AccountFilter::default()
            .with_emails([credentials.email()])
            .with_active(true);
        let accounts = self.store.find_accounts(&filter, self.deadline()).await?;
        let account = match accounts.as_slice() {
            [account] => account,
            _ => return Err(invalid_credentials()),
        };
        let password = Password::parse(credentials.password()).map_err(|_| invalid_credentials())?;
        if !password.matches_blocking(&account.password_hash).await {
            return Err(invalid_credentials());
        }
        let token = self.tokens.issue(account)?;
        info!(account_id = %account.id, "login succeeded");
        Ok(token)
    }

    /// Accounts matching `filter`.
    pub async fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>, Error> {
        Ok(self.store.find_accounts(filter, self.deadline()).await?)
    }

    /// One account by identifier.
    pub async fn get(&self, id: &AccountId) -> Result<Account, Error> {
        let filter = AccountFilter::default().with_ids([id.clone()]);
        let mut accounts = self.store.find_accounts(&filter, self.deadline()).await?;
        accounts
            .pop()
            .ok_or_else(|| Error::not_found(format!("account {id} not found")))
    }

    /// Apply a partial update and return the stored result.
    pub async fn update(&self, id: &AccountId, update: AccountUpdate) -> Result<Account, Error> {
        let now = stored_now(self.clock.as_ref());
        let id = id.clone();
        in_unit_of_work(self.store.as_ref(), self.deadline(), move |unit| {
            Box::pin(async move {
                unit.update_account(&id, &update, now)
                    .await
                    .map_err(|err| not_found_as(err, &id))?;
                let mut found = unit
                    .find_accounts(&AccountFilter::default().with_ids([id.clone()]))
                    .await?;
                found
                    .pop()
                    .ok_or_else(|| Error::not_found(format!("account {id} not found")))
            })
        })
        .await
    }

    /// Apply a partial update, replacing the password hash when `password`
    /// is given. Both changes land in one unit of work.
    pub async fn update_with_password(
        &self,
        id: &AccountId,
        mut update: AccountUpdate,
        password: Option<&Password>,
    ) -> Result<Account, Error> {
        if let Some(password) = password {
            update.password_hash = Some(hash(password).await?);
        }
        self.update(id, update).await
    }

    /// Remove an account.
    pub async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        let id = id.clone();
        in_unit_of_work(self.store.as_ref(), self.deadline(), move |unit| {
            Box::pin(async move {
                unit.delete_account(&id)
                    .await
                    .map_err(|err| not_found_as(err, &id))
            })
        })
        .await?;
        Ok(())
    }

    async fn build_account(
        &self,
        email: &str,
        password: &Password,
        role: &str,
        is_active: bool,
    ) -> Result<Account, Error> {
        let password_hash = hash(password).await?;
        let now = stored_now(self.clock.as_ref());
        Ok(Account {
            id: AccountId::generate(),
            email: email.to_owned(),
            password_hash,
            role: role.to_owned(),
            is_active,
            created_at: now,
            updated_at: now,
        })
    }

    async fn insert(&self, account: Account) -> Result<Account, Error> {
        let created = in_unit_of_work(self.store.as_ref(), self.deadline(), move |unit| {
            Box::pin(async move {
                unit.create_account(&account).await.map_err(|err| match err {
                    StoreError::AlreadyExists => {
                        Error::conflict(format!("account {} already exists", account.email))
                    }
                    other => Error::from(other),
                })?;
                Ok::<_, Error>(account)
            })
        })
        .await?;
        info!(account_id = %created.id, role = %created.role, "account created");
        Ok(created)
    }
}

async fn hash(password: &Password) -> Result<String, Error> {
    password
        .hash_blocking()
        .await
        .map_err(|err| Error::internal(err.to_string()))
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

fn not_found_as(err: StoreError, id: &AccountId) -> Error {
    match err {
        StoreError::NotFound => Error::not_found(format!("account {id} not found")),
        other => Error::from(other),
    }
}

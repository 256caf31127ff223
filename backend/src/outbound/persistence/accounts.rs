//! Account rows in the `accounts` table.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::ports::StoreError;
use crate::domain::{Account, AccountFilter, AccountId, AccountUpdate};

use super::error_mapping::{map_build_error, map_sqlx_error};
use super::executor::{StatementExecutor, require_rows};
use super::query::{QueryBuilder, Statement};

const COLUMNS: &str = "id, email, password_hash, role, is_active, created_at, updated_at";

pub(super) fn insert_statement(account: &Account) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new(format!("INSERT INTO accounts ({COLUMNS}) VALUES ("));
    query
        .push_param(account.id.as_str())
        .push(", ")
        .push_param(account.email.as_str())
        .push(", ")
        .push_param(account.password_hash.as_str())
        .push(", ")
        .push_param(account.role.as_str())
        .push(", ")
        .push_param(account.is_active)
        .push(", ")
        .push_param(account.created_at)
        .push(", ")
        .push_param(account.updated_at)
        .push(")");
    query.build().map_err(map_build_error)
}

pub(super) fn update_statement(
    id: &AccountId,
    update: &AccountUpdate,
    now: DateTime<Utc>,
) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new("UPDATE accounts SET updated_at = ");
    query.push_param(now);
    if let Some(email) = &update.email {
        query.push(", email = ").push_param(email.as_str());
    }
    if let Some(password_hash) = &update.password_hash {
        query.push(", password_hash = ").push_param(password_hash.as_str());
    }
    if let Some(role) = &update.role {
        query.push(", role = ").push_param(role.as_str());
    }
    if let Some(is_active) = update.is_active {
        query.push(", is_active = ").push_param(is_active);
    }
    query.push(" WHERE id = ").push_param(id.as_str());
    query.build().map_err(map_build_error)
}

pub(super) fn delete_statement(id: &AccountId) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new("DELETE FROM accounts WHERE id = ");
    query.push_param(id.as_str());
    query.build().map_err(map_build_error)
}

pub(super) fn find_statement(filter: &AccountFilter) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM accounts WHERE 1=1"));
    if !filter.ids.is_empty() {
        query
            .push(" AND id IN (")
            .push_params(filter.ids.iter().map(AccountId::as_str))
            .push(")");
    }
    if !filter.emails.is_empty() {
        query
            .push(" AND email IN (")
            .push_params(filter.emails.iter().map(String::as_str))
            .push(")");
    }
    if let Some(active) = filter.active {
        query.push(" AND is_active = ").push_param(active);
    }
    query.push(" ORDER BY id ASC");
    query.build().map_err(map_build_error)
}

fn from_row(row: &PgRow) -> Result<Account, sqlx::Error> {
    Ok(Account {
        id: AccountId::new(row.try_get::<String, _>("id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get("role")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Insert `account`. An empty identifier never reaches the database.
pub async fn create<E>(executor: &mut E, account: &Account) -> Result<(), StoreError>
where
    E: StatementExecutor + ?Sized,
{
    if account.id.is_empty() {
        return Err(StoreError::already_exists());
    }
    executor.execute(insert_statement(account)?).await.map(drop)
}

/// Apply `update` to the account with `id`.
pub async fn update<E>(
    executor: &mut E,
    id: &AccountId,
    update: &AccountUpdate,
    now: DateTime<Utc>,
) -> Result<(), StoreError>
where
    E: StatementExecutor + ?Sized,
{
    let affected = executor.execute(update_statement(id, update, now)?).await?;
    require_rows(affected)
}

/// Remove the account with `id`.
pub async fn delete<E>(executor: &mut E, id: &AccountId) -> Result<(), StoreError>
where
    E: StatementExecutor + ?Sized,
{
    let affected = executor.execute(delete_statement(id)?).await?;
    require_rows(affected)
}

/// Accounts matching `filter`, ordered by identifier.
pub async fn find<E>(executor: &mut E, filter: &AccountFilter) -> Result<Vec<Account>, StoreError>
where
    E: StatementExecutor + ?Sized,
{
    let rows = executor.query(find_statement(filter)?).await?;
    rows.iter()
        .map(|row| from_row(row).map_err(map_sqlx_error))
        .collect()
}

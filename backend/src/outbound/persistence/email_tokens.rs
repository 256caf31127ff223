//! Single-use email tokens in the `email_tokens` table.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::ports::StoreError;
use crate::domain::{AccountId, EmailToken, TokenPurpose};

use super::error_mapping::{map_build_error, map_sqlx_error};
use super::executor::{StatementExecutor, require_rows};
use super::query::{QueryBuilder, Statement};

const COLUMNS: &str = "id, token_hash, account_id, email, purpose, created_at, consumed_at";

pub(super) fn insert_statement(token: &EmailToken) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new(format!("INSERT INTO email_tokens ({COLUMNS}) VALUES ("));
    query
        .push_param(token.id.as_str())
        .push(", ")
        .push_param(token.token_hash.as_str())
        .push(", ")
        .push_param(token.account_id.as_str())
        .push(", ")
        .push_param(token.email.as_str())
        .push(", ")
        .push_param(token.purpose.as_str())
        .push(", ")
        .push_param(token.created_at)
        .push(", ")
        .push_param(token.consumed_at)
        .push(")");
    query.build().map_err(map_build_error)
}

pub(super) fn consume_statement(id: &str, at: DateTime<Utc>) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new("UPDATE email_tokens SET consumed_at = ");
    query
        .push_param(at)
        .push(" WHERE id = ")
        .push_param(id)
        .push(" AND consumed_at IS NULL");
    query.build().map_err(map_build_error)
}

pub(super) fn find_statement(id: &str) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM email_tokens WHERE id = "));
    query.push_param(id);
    query.build().map_err(map_build_error)
}

fn from_row(row: &PgRow) -> Result<EmailToken, StoreError> {
    let label: String = row.try_get("purpose").map_err(map_sqlx_error)?;
    let purpose = TokenPurpose::from_label(&label)
        .ok_or_else(|| StoreError::query(format!("unknown email token purpose {label:?}")))?;
    let read = || -> Result<EmailToken, sqlx::Error> {
        Ok(EmailToken {
            id: row.try_get("id")?,
            token_hash: row.try_get("token_hash")?,
            account_id: AccountId::new(row.try_get::<String, _>("account_id")?),
            email: row.try_get("email")?,
            purpose,
            created_at: row.try_get("created_at")?,
            consumed_at: row.try_get("consumed_at")?,
        })
    };
    read().map_err(map_sqlx_error)
}

/// Insert a freshly minted token.
pub async fn create<E>(executor: &mut E, token: &EmailToken) -> Result<(), StoreError>
where
    E: StatementExecutor + ?Sized,
{
    if token.id.is_empty() {
        return Err(StoreError::already_exists());
    }
    executor.execute(insert_statement(token)?).await.map(drop)
}

/// The token with `id`, or [`StoreError::NotFound`].
pub async fn find<E>(executor: &mut E, id: &str) -> Result<EmailToken, StoreError>
where
    E: StatementExecutor + ?Sized,
{
    let rows = executor.query(find_statement(id)?).await?;
    rows.first().map_or(Err(StoreError::NotFound), from_row)
}

/// Mark the token consumed. Unknown or already consumed tokens are
/// [`StoreError::NotFound`].
pub async fn consume<E>(executor: &mut E, id: &str, at: DateTime<Utc>) -> Result<(), StoreError>
where
    E: StatementExecutor + ?Sized,
{
    let affected = executor.execute(consume_statement(id, at)?).await?;
    require_rows(affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::persistence::SqlParam;
    use crate::test_support::account_fixture;
    use rstest::rstest;

    #[rstest]
    fn insert_binds_purpose_label_and_null_consumption() {
        let account = account_fixture("3", "ada@example.com", "user");
        let (token, _raw) = EmailToken::issue(&account, TokenPurpose::PasswordReset, account.created_at);
        let statement = insert_statement(&token).expect("statement");
        assert_eq!(statement.params.len(), 7);
        assert_eq!(
            statement.params.get(4),
            Some(&SqlParam::Text("password_reset".to_owned()))
        );
        assert_eq!(statement.params.last(), Some(&SqlParam::OptionalTimestamp(None)));
    }

    #[rstest]
    fn find_selects_every_column_by_id() {
        let statement = find_statement("11").expect("statement");
        assert_eq!(
            statement.sql,
            "SELECT id, token_hash, account_id, email, purpose, created_at, consumed_at \
             FROM email_tokens WHERE id = $1"
        );
        assert_eq!(statement.params, vec![SqlParam::Text("11".to_owned())]);
    }

    #[rstest]
    fn consume_only_matches_open_tokens() {
        let statement = consume_statement("11", DateTime::<Utc>::UNIX_EPOCH).expect("statement");
        assert_eq!(
            statement.sql,
            "UPDATE email_tokens SET consumed_at = $1 WHERE id = $2 AND consumed_at IS NULL"
        );
    }
}

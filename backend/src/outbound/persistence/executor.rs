//! Execution seam shared by the pool and open transactions.
//!
//! Repository functions are written once against [`StatementExecutor`] and
//! run unchanged on either side of a transaction boundary.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Transaction};

use crate::domain::ports::StoreError;

use super::error_mapping::map_sqlx_error;
use super::pool::DbPool;
use super::query::{SqlParam, Statement};

/// Runs assembled statements.
#[async_trait]
pub trait StatementExecutor: Send {
    /// Run a statement and report how many rows it touched.
    async fn execute(&mut self, statement: Statement) -> Result<u64, StoreError>;

    /// Run a statement and collect every row it returns.
    async fn query(&mut self, statement: Statement) -> Result<Vec<PgRow>, StoreError>;
}

fn bind(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
    statement
        .params
        .iter()
        .fold(sqlx::query(&statement.sql), |query, param| match param {
            SqlParam::Text(value) => query.bind(value.as_str()),
            SqlParam::OptionalText(value) => query.bind(value.as_deref()),
            SqlParam::Bool(value) => query.bind(*value),
            SqlParam::Timestamp(value) => query.bind(*value),
            SqlParam::OptionalTimestamp(value) => query.bind(*value),
        })
}

#[async_trait]
impl StatementExecutor for DbPool {
    async fn execute(&mut self, statement: Statement) -> Result<u64, StoreError> {
        bind(&statement)
            .execute(self.inner())
            .await
            .map(|done| done.rows_affected())
            .map_err(map_sqlx_error)
    }

    async fn query(&mut self, statement: Statement) -> Result<Vec<PgRow>, StoreError> {
        bind(&statement)
            .fetch_all(self.inner())
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl StatementExecutor for Transaction<'static, Postgres> {
    async fn execute(&mut self, statement: Statement) -> Result<u64, StoreError> {
        bind(&statement)
            .execute(&mut **self)
            .await
            .map(|done| done.rows_affected())
            .map_err(map_sqlx_error)
    }

    async fn query(&mut self, statement: Statement) -> Result<Vec<PgRow>, StoreError> {
        bind(&statement)
            .fetch_all(&mut **self)
            .await
            .map_err(map_sqlx_error)
    }
}

/// Turn "no rows touched" into [`StoreError::NotFound`].
pub(super) fn require_rows(affected: u64) -> Result<(), StoreError> {
    if affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

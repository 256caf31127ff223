//! Positional-parameter statement assembly.
//!
//! [`QueryBuilder`] interleaves trusted literal SQL with bound values and
//! numbers placeholders `$1..$N` in the order values are pushed. Literal
//! fragments are never escaped, so only table and column names belong there.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A value bound to one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    /// `TEXT`.
    Text(String),
    /// Nullable `TEXT`.
    OptionalText(Option<String>),
    /// `BOOLEAN`.
    Bool(bool),
    /// `TIMESTAMPTZ`.
    Timestamp(DateTime<Utc>),
    /// Nullable `TIMESTAMPTZ`.
    OptionalTimestamp(Option<DateTime<Utc>>),
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Option<DateTime<Utc>>> for SqlParam {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        Self::OptionalTimestamp(value)
    }
}

impl From<Option<String>> for SqlParam {
    fn from(value: Option<String>) -> Self {
        Self::OptionalText(value)
    }
}

/// Statement assembly failures, reported by [`QueryBuilder::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryBuildError {
    /// `push_params` received no values; `IN ()` is not valid SQL.
    #[error("empty parameter list")]
    EmptyParamList,
}

/// SQL text with its bound values, ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL with `$n` placeholders.
    pub sql: String,
    /// Values in placeholder order.
    pub params: Vec<SqlParam>,
}

/// Accumulates SQL and parameters.
///
/// # Examples
/// ```
/// use hestia::outbound::persistence::{QueryBuilder, SqlParam};
///
/// let mut query = QueryBuilder::new("SELECT id FROM accounts WHERE email = ");
/// query.push_param("ada@example.com").push(" AND is_active = ").push_param(true);
/// let statement = query.build().unwrap();
/// assert_eq!(statement.sql, "SELECT id FROM accounts WHERE email = $1 AND is_active = $2");
/// assert_eq!(statement.params.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct QueryBuilder {
    sql: String,
    params: Vec<SqlParam>,
    error: Option<QueryBuildError>,
}

impl QueryBuilder {
    /// Start with `sql` as the leading literal.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    /// Append trusted literal text.
    pub fn push(&mut self, literal: &str) -> &mut Self {
        self.sql.push_str(literal);
        self
    }

    /// Append the next placeholder and bind `value` to it.
    pub fn push_param(&mut self, value: impl Into<SqlParam>) -> &mut Self {
        self.params.push(value.into());
        self.sql.push('$');
        self.sql.push_str(&self.params.len().to_string());
        self
    }

    /// Append one placeholder per value, separated by `", "`.
    ///
    /// An empty iterator records [`QueryBuildError::EmptyParamList`], which
    /// [`QueryBuilder::build`] then returns.
    pub fn push_params<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<SqlParam>,
    {
        let mut pushed = false;
        for value in values {
            if pushed {
                self.sql.push_str(", ");
            }
            self.push_param(value);
            pushed = true;
        }
        if !pushed && self.error.is_none() {
            self.error = Some(QueryBuildError::EmptyParamList);
        }
        self
    }

    /// Finish the statement.
    ///
    /// # Errors
    /// The first construction error recorded while pushing.
    pub fn build(self) -> Result<Statement, QueryBuildError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(Statement {
                sql: self.sql,
                params: self.params,
            }),
        }
    }
}

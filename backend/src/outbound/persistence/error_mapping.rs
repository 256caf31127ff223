//! Translation of `sqlx` failures into [`StoreError`].
//!
//! Applied at every repository call site straight after the driver returns.

use tracing::debug;

use crate::domain::ports::StoreError;

use super::query::QueryBuildError;

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a driver error onto the store taxonomy.
pub fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::RowNotFound => StoreError::not_found(),
        sqlx::Error::Database(db) => {
            let code = db.code();
            debug!(code = code.as_deref(), message = db.message(), "database rejected statement");
            if code.as_deref() == Some(UNIQUE_VIOLATION) {
                StoreError::already_exists()
            } else {
                StoreError::query(db.message())
            }
        }
        err @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
            debug!(error = %err, "database connection failed");
            StoreError::connection(err.to_string())
        }
        other => {
            debug!(error = %other, "database operation failed");
            StoreError::query(other.to_string())
        }
    }
}

/// Map a statement construction failure.
pub fn map_build_error(error: QueryBuildError) -> StoreError {
    StoreError::invalid_statement(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn row_not_found_is_not_found() {
        assert_eq!(map_sqlx_error(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[rstest]
    #[case::timeout(sqlx::Error::PoolTimedOut)]
    #[case::closed(sqlx::Error::PoolClosed)]
    #[case::io(sqlx::Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset)))]
    fn pool_and_io_failures_are_connection_errors(#[case] error: sqlx::Error) {
        assert!(matches!(map_sqlx_error(error), StoreError::Connection { .. }));
    }

    #[rstest]
    #[case::protocol(sqlx::Error::Protocol("unexpected message".to_owned()))]
    #[case::column(sqlx::Error::ColumnNotFound("email".to_owned()))]
    fn other_failures_pass_through_as_query_errors(#[case] error: sqlx::Error) {
        let expected = error.to_string();
        assert_eq!(map_sqlx_error(error), StoreError::query(expected));
    }

    #[rstest]
    fn empty_parameter_lists_are_invalid_statements() {
        assert_eq!(
            map_build_error(QueryBuildError::EmptyParamList),
            StoreError::invalid_statement("empty parameter list")
        );
    }
}

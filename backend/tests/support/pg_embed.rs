//! Embedded PostgreSQL bootstrap for integration tests.
//!
//! `pg-embed-setup-unpriv` installs into `/var/tmp` by default, which
//! sandboxed runners cannot write to. When `PG_RUNTIME_DIR` or `PG_DATA_DIR`
//! is unset, both are pointed under the target directory for the duration of
//! the bootstrap. The cluster is shared by every test in the binary; each
//! test gets its own temporary database with the schema applied.

use std::path::PathBuf;
use std::time::Duration;

use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use uuid::Uuid;

use super::format_postgres_error;

const SCHEMA: &str = include_str!("../../schema/hestia.sql");

/// Maximum number of retry attempts for transient bootstrap errors.
const MAX_RETRIES: u32 = 3;

/// Base delay between retry attempts (doubles with each retry).
const RETRY_DELAY_MS: u64 = 500;

fn pg_embed_target_dir() -> PathBuf {
    if let Some(target_dir) = std::env::var_os("CARGO_TARGET_DIR") {
        return PathBuf::from(target_dir).join("pg-embed");
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("target")
        .join("pg-embed")
}

/// Returns true if the error message suggests a transient network issue.
fn is_transient_error(err: &str) -> bool {
    let transient_patterns = [
        "error decoding response body",
        "connection reset",
        "connection refused",
        "timed out",
        "temporarily unavailable",
        "dns error",
    ];

    let err_lower = err.to_lowercase();
    transient_patterns
        .iter()
        .any(|pattern| err_lower.contains(pattern))
}

/// Starts (or reuses) the process-wide embedded cluster.
///
/// Binary downloads fail intermittently when suites run in parallel, so
/// transient errors are retried with exponential backoff.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let needs_override =
        std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none();
    let _env_guard = needs_override.then(|| {
        let base = pg_embed_target_dir().join(format!("hestia-{}", std::process::id()));
        env_lock::lock_env([
            (
                "PG_RUNTIME_DIR",
                Some(base.join("install").to_string_lossy().into_owned()),
            ),
            (
                "PG_DATA_DIR",
                Some(base.join("data").to_string_lossy().into_owned()),
            ),
        ])
    });

    let mut last_error = String::new();
    for attempt in 0..=MAX_RETRIES {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) => {
                last_error = format!("{err:?}");
                if attempt < MAX_RETRIES && is_transient_error(&last_error) {
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * (1 << attempt)));
                } else {
                    break;
                }
            }
        }
    }
    Err(last_error)
}

fn new_database_name() -> String {
    format!("hestia_test_{}", Uuid::new_v4().simple())
}

/// Creates a fresh database on `cluster` and applies the Hestia schema.
///
/// The database is dropped when the returned guard is dropped.
pub fn provision_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let database = cluster
        .temporary_database(new_database_name())
        .map_err(|err| format!("create database: {err:?}"))?;
    apply_schema(database.url())?;
    Ok(database)
}

fn apply_schema(url: &str) -> Result<(), String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(SCHEMA)
        .map_err(|err| format!("apply schema: {}", format_postgres_error(&err)))
}

#[cfg(test)]
mod tests {
    //! Retry classification checks.

    use rstest::rstest;

    use super::{is_transient_error, new_database_name};

    #[rstest]
    #[case("Connection reset by peer", true)]
    #[case("request timed out", true)]
    #[case("initdb: permission denied", false)]
    fn transient_errors_are_recognised(#[case] message: &str, #[case] expected: bool) {
        assert_eq!(is_transient_error(message), expected);
    }

    #[rstest]
    fn database_names_are_unique_unquoted_identifiers() {
        let first = new_database_name();
        assert_ne!(first, new_database_name());
        assert!(first.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
    }
}

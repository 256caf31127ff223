//! A `PgStore` over a freshly provisioned database plus the runtime to drive it.

use std::future::Future;
use std::time::Duration;

use hestia::domain::ports::Deadline;
use hestia::outbound::persistence::{DbPool, PgStore, PoolConfig};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use tokio::runtime::Runtime;

use super::handle_cluster_setup_failure;
use super::pg_embed::{provision_database, shared_cluster};

/// Store under test. Dropping it drops the temporary database.
pub struct PgContext {
    runtime: Runtime,
    pub store: PgStore,
    _database: TemporaryDatabase,
}

impl PgContext {
    /// Drive `fut` on this context's runtime.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}

fn setup_context() -> Result<PgContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_database(cluster)?;
    let config = PoolConfig::new(database.url())
        .with_max_size(2)
        .with_min_idle(1);
    let pool = runtime
        .block_on(DbPool::connect(&config))
        .map_err(|err| err.to_string())?;
    Ok(PgContext {
        runtime,
        store: PgStore::new(pool),
        _database: database,
    })
}

/// Context for one test, or `None` when the cluster is skipped.
pub fn pg_context() -> Option<PgContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

/// Generous bound for test statements.
pub fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(5))
}

//! PostgreSQL connection pool.
//!
//! Wraps `sqlx`'s pool so startup code configures limits in one place and
//! pool failures arrive as [`PoolError`] rather than raw `sqlx` errors.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Errors raised while building the pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The pool could not be built or could not reach the server.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    /// Create a build error with the given message.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Pool sizing and checkout limits.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use hestia::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://localhost/hestia")
///     .with_max_size(20)
///     .with_acquire_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_size(), 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: u32,
    acquire_timeout: Duration,
}

impl PoolConfig {
    /// Configuration with defaults: ten connections, two idle, 30s checkout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            min_idle: 2,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the number of idle connections kept warm.
    #[must_use]
    pub const fn with_min_idle(mut self, min_idle: u32) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Set how long a checkout may wait for a free connection.
    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Database URL.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Maximum number of connections.
    #[must_use]
    pub const fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Shared handle to the PostgreSQL pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DbPool {
    inner: PgPool,
}

impl DbPool {
    /// Build the pool and open the first connection.
    ///
    /// # Errors
    /// [`PoolError::Build`] when the URL is invalid or the server is
    /// unreachable.
    pub async fn connect(config: &PoolConfig) -> Result<Self, PoolError> {
        let inner = PgPoolOptions::new()
            .max_connections(config.max_size)
            .min_connections(config.min_idle.min(config.max_size))
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Wrap an existing `sqlx` pool.
    #[must_use]
    pub const fn from_pool(inner: PgPool) -> Self {
        Self { inner }
    }

    /// Borrow the underlying `sqlx` pool.
    #[must_use]
    pub const fn inner(&self) -> &PgPool {
        &self.inner
    }

    /// Close every connection, waiting for checked-out ones to return.
    pub async fn close(&self) {
        self.inner.close().await;
    }
}

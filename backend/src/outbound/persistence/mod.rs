//! PostgreSQL persistence adapters built on `sqlx`.
//!
//! # Architecture
//!
//! - **Statements**: SQL is assembled with [`QueryBuilder`], which numbers
//!   `$n` placeholders and keeps bound values beside the text. Only table and
//!   column names are ever written as literals.
//! - **Repositories**: [`accounts`], [`listings`] and [`email_tokens`] hold
//!   free functions generic over [`StatementExecutor`], so the same code runs
//!   on the pool or inside a transaction.
//! - **Errors**: every driver error passes through [`map_sqlx_error`] at the
//!   call site and leaves this module as a
//!   [`StoreError`](crate::domain::ports::StoreError).
//! - **Store**: [`PgStore`] and [`PgUnitOfWork`] implement the domain ports.
//!   Every call is bounded by the caller's
//!   [`Deadline`](crate::domain::ports::Deadline), except an explicit
//!   rollback, which gets a fixed grace period of its own.
//!
//! # Example
//!
//! ```ignore
//! use hestia::outbound::persistence::{DbPool, PgStore, PoolConfig};
//!
//! let pool = DbPool::connect(&PoolConfig::new("postgres://localhost/hestia")).await?;
//! let store = PgStore::new(pool);
//! ```

pub mod accounts;
pub mod email_tokens;
mod error_mapping;
mod executor;
pub mod listings;
mod pool;
mod query;
mod store;

pub use error_mapping::{map_build_error, map_sqlx_error};
pub use executor::StatementExecutor;
pub use pool::{DbPool, PoolConfig, PoolError};
pub use query::{QueryBuildError, QueryBuilder, SqlParam, Statement};
pub use store::{PgStore, PgUnitOfWork};

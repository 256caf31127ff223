//! Hestia: accounts and listings over PostgreSQL with bearer-token access
//! control.
//!
//! - [`domain`]: entities, token manager, route policy, interceptor, services
//!   and the ports they drive.
//! - [`inbound`]: the actix-web HTTP adapter.
//! - [`outbound`]: `sqlx` persistence and the HTTP mail relay client.
//! - [`middleware`]: request tracing.
//! - [`settings`]: process configuration.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use middleware::Trace;

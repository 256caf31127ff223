//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL store and repositories using `sqlx`
//! - **mail**: HTTP relay client for templated email
//!
//! Adapters translate between domain types and infrastructure representations
//! and contain no business logic.

pub mod mail;
pub mod persistence;

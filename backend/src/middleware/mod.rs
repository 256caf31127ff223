//! Request middleware.
//!
//! Request lifecycle concerns that apply to every route: trace identifiers
//! and the completion log line. Access control lives with the HTTP adapter in
//! [`crate::inbound::http::bearer`].

pub mod trace;

pub use trace::Trace;

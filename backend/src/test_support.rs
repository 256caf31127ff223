//! Test doubles shared by unit and integration tests.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature so the
//! `tests/` suites can reuse them.

mod clock;
mod http;
mod memory_store;
mod tokens;

pub use clock::MutableClock;
pub use http::TestServices;
pub use memory_store::MemoryStore;
pub use tokens::{FIXTURE_SECRET, TokenFixture};

use chrono::{TimeZone, Utc};

use crate::domain::{Account, AccountId};

/// Active account with a fixed creation instant and an unusable hash.
#[must_use]
pub fn account_fixture(id: &str, email: &str, role: &str) -> Account {
    let created = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    Account {
        id: AccountId::new(id),
        email: email.to_owned(),
        password_hash: "$argon2id$fixture".to_owned(),
        role: role.to_owned(),
        is_active: true,
        created_at: created,
        updated_at: created,
    }
}

//! Token manager on a hand-driven clock.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use super::MutableClock;
use crate::domain::{Account, TokenManager, TokenSecret, TokenSettings};

/// Signing secret used by [`TokenFixture`].
pub const FIXTURE_SECRET: &[u8] = b"fixture-signing-secret-0123456789";

/// Issues and verifies tokens at a controllable instant.
#[derive(Clone)]
pub struct TokenFixture {
    clock: Arc<MutableClock>,
    manager: Arc<TokenManager>,
}

impl Default for TokenFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenFixture {
    /// Two-hour tokens, clock at 2026-01-01T00:00:00Z.
    ///
    /// # Panics
    /// Never in practice; the fixture secret and lifetime are valid.
    #[must_use]
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        let clock = Arc::new(MutableClock::new(start));
        let secret = TokenSecret::new(FIXTURE_SECRET).expect("fixture secret is not empty");
        let settings = TokenSettings::new(secret, Duration::from_secs(2 * 60 * 60))
            .expect("fixture lifetime is positive");
        let manager = Arc::new(TokenManager::new(settings, clock.clone()));
        Self { clock, manager }
    }

    /// Clock shared with the manager.
    #[must_use]
    pub fn clock(&self) -> Arc<MutableClock> {
        Arc::clone(&self.clock)
    }

    /// The manager itself.
    #[must_use]
    pub fn manager(&self) -> Arc<TokenManager> {
        Arc::clone(&self.manager)
    }

    /// Sign a token for `account`.
    ///
    /// # Panics
    /// When signing fails, which the fixture secret rules out.
    #[must_use]
    pub fn issue(&self, account: &Account) -> String {
        self.manager.issue(account).expect("fixture token issues")
    }
}

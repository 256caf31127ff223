//! Single-use tokens delivered by email.
//!
//! Only the SHA-256 digest of a token is stored. The raw value is handed to
//! the mailer once and then dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::account::random_numeric_id;
use super::{Account, AccountId};

/// What a token authorises its bearer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Activate a freshly registered account.
    Activate,
    /// Choose a new password.
    PasswordReset,
}

impl TokenPurpose {
    /// Label stored in the `purpose` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::PasswordReset => "password_reset",
        }
    }

    /// Parse a stored label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "activate" => Some(Self::Activate),
            "password_reset" => Some(Self::PasswordReset),
            _ => None,
        }
    }
}

/// Stored token state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailToken {
    pub id: String,
    /// Hex-encoded SHA-256 of the raw token.
    pub token_hash: String,
    pub account_id: AccountId,
    pub email: String,
    pub purpose: TokenPurpose,
    pub created_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

/// Values sent to the recipient. Serialised into the mail payload.
#[derive(Clone, Serialize)]
pub struct RawEmailToken {
    pub id: String,
    pub token: Zeroizing<String>,
}

impl std::fmt::Debug for RawEmailToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawEmailToken")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl EmailToken {
    /// Mint a token for `account`, returning the stored state and the raw
    /// value to deliver.
    #[must_use]
    pub fn issue(account: &Account, purpose: TokenPurpose, now: DateTime<Utc>) -> (Self, RawEmailToken) {
        let mut bytes = Zeroizing::new([0_u8; 32]);
        rand::thread_rng().fill_bytes(&mut *bytes);
        let raw = Zeroizing::new(hex::encode(bytes.as_slice()));
        let id = random_numeric_id();
        let stored = Self {
            id: id.clone(),
            token_hash: digest(&raw),
            account_id: account.id.clone(),
            email: account.email.clone(),
            purpose,
            created_at: now,
            consumed_at: None,
        };
        (stored, RawEmailToken { id, token: raw })
    }

    /// `true` when `raw` is the token this record was minted from.
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        digest(raw) == self.token_hash
    }

    /// `true` when the token serves `purpose`, is unconsumed, and is younger
    /// than `lifetime` at `now`. Tokens dated in the future never qualify.
    #[must_use]
    pub fn is_redeemable(&self, purpose: TokenPurpose, now: DateTime<Utc>, lifetime: Duration) -> bool {
        self.purpose == purpose
            && self.consumed_at.is_none()
            && now
                .signed_duration_since(self.created_at)
                .to_std()
                .is_ok_and(|age| age < lifetime)
    }
}

fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

//! Signed identity tokens.
//!
//! Tokens are JWS compact strings signed with HMAC-SHA256 under a single
//! process-wide secret. Verification pins the algorithm: a header naming
//! anything but `HS256` (including `none`) is rejected before the signature
//! is looked at.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use mockable::Clock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

use super::{Account, AccountId};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const FINGERPRINT_BYTES: usize = 8;

/// Why a token failed verification. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTokenReason {
    /// Not three base64url segments of JSON.
    Malformed,
    /// Header names an algorithm other than HS256.
    Algorithm,
    /// Signature does not match the secret.
    Signature,
    /// `exp` is not in the future.
    Expired,
}

impl fmt::Display for InvalidTokenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Malformed => "malformed",
            Self::Algorithm => "unexpected algorithm",
            Self::Signature => "signature mismatch",
            Self::Expired => "expired",
        })
    }
}

/// Token issue and verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The presented token cannot be trusted.
    #[error("invalid token: {0}")]
    InvalidToken(InvalidTokenReason),
    /// Claims could not be encoded.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Token settings rejected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenSettingsError {
    /// The signing secret is empty.
    #[error("token secret must not be empty")]
    EmptySecret,
    /// Tokens carry whole-second expiry, so anything shorter than a second
    /// would be expired on issue.
    #[error("token lifetime must be at least one second")]
    SubSecondLifetime,
}

/// HMAC signing secret. Zeroized on drop and never printed.
#[derive(Clone)]
pub struct TokenSecret(Zeroizing<Vec<u8>>);

impl TokenSecret {
    /// Wrap raw secret bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, TokenSettingsError> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(TokenSettingsError::EmptySecret);
        }
        Ok(Self(bytes))
    }

    /// First eight bytes of the secret's SHA-256, hex encoded.
    ///
    /// Safe to log; lets operators tell which secret a node runs with.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_slice());
        hex::encode(digest.get(..FINGERPRINT_BYTES).unwrap_or_default())
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenSecret({})", self.fingerprint())
    }
}

/// Immutable token configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    secret: TokenSecret,
    lifetime: Duration,
}

impl TokenSettings {
    /// Validate and bundle the signing secret and token lifetime.
    pub fn new(secret: TokenSecret, lifetime: Duration) -> Result<Self, TokenSettingsError> {
        if lifetime.as_secs() == 0 {
            return Err(TokenSettingsError::SubSecondLifetime);
        }
        Ok(Self { secret, lifetime })
    }

    /// Signing secret.
    #[must_use]
    pub const fn secret(&self) -> &TokenSecret {
        &self.secret
    }

    /// How long an issued token stays valid.
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

/// Verified token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject account identifier.
    pub id: String,
    /// Subject email at issue time.
    pub email: String,
    /// Subject role at issue time.
    pub role: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    /// Subject as an account identifier.
    #[must_use]
    pub fn subject(&self) -> AccountId {
        AccountId::new(self.id.clone())
    }
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Issues and verifies HS256 identity tokens.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use chrono::Utc;
/// use hestia::domain::{Account, AccountId, TokenManager, TokenSecret, TokenSettings};
///
/// let secret = TokenSecret::new("s3cret").expect("non-empty secret");
/// let settings = TokenSettings::new(secret, Duration::from_secs(60)).expect("positive lifetime");
/// let manager = TokenManager::new(settings, Arc::new(mockable::DefaultClock));
/// let now = Utc::now();
/// let account = Account {
///     id: AccountId::new("42"),
///     email: "ada@example.com".into(),
///     password_hash: String::new(),
///     role: "admin".into(),
///     is_active: true,
///     created_at: now,
///     updated_at: now,
/// };
/// let token = manager.issue(&account).expect("token issued");
/// assert_eq!(manager.verify(&token).expect("token verifies").id, "42");
/// ```
pub struct TokenManager {
    settings: TokenSettings,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    /// Build a manager reading time from `clock`.
    pub fn new(settings: TokenSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    /// Settings the manager signs with.
    #[must_use]
    pub const fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Sign a token for `subject`, expiring one lifetime from now.
    pub fn issue(&self, subject: &Account) -> Result<String, TokenError> {
        let now = self.clock.utc().timestamp();
        let lifetime = i64::try_from(self.settings.lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            id: subject.id.to_string(),
            email: subject.email.clone(),
            role: subject.role.clone(),
            iat: now,
            exp: now.saturating_add(lifetime),
        };
        let header = Header {
            alg: ALGORITHM.to_owned(),
            typ: Some("JWT".to_owned()),
        };
        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Check algorithm, signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(invalid(InvalidTokenReason::Malformed));
        };

        let parsed_header: Header = decode_segment(header)?;
        if parsed_header.alg != ALGORITHM {
            return Err(invalid(InvalidTokenReason::Algorithm));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| invalid(InvalidTokenReason::Malformed))?;
        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid(InvalidTokenReason::Signature))?;

        let claims: Claims = decode_segment(payload)?;
        if self.clock.utc().timestamp() >= claims.exp {
            return Err(invalid(InvalidTokenReason::Expired));
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.settings.secret.0)
            .map_err(|err| TokenError::Encoding(err.to_string()))
    }
}

const fn invalid(reason: InvalidTokenReason) -> TokenError {
    TokenError::InvalidToken(reason)
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    serde_json::to_vec(value)
        .map(|json| URL_SAFE_NO_PAD.encode(json))
        .map_err(|err| TokenError::Encoding(err.to_string()))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| invalid(InvalidTokenReason::Malformed))?;
    serde_json::from_slice(&bytes).map_err(|_| invalid(InvalidTokenReason::Malformed))
}

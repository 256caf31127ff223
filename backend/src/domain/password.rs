//! Plaintext password handling.
//!
//! A [`Password`] only exists after the length policy has been checked. The
//! plaintext is zeroized on drop and never printed; it leaves the type only
//! as an argon2id PHC hash.

use std::fmt;

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// Shortest accepted password, in bytes.
pub const MIN_PASSWORD_BYTES: usize = 8;
/// Longest accepted password, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 512;

const REDACTED: &str = "<redacted>";

/// The candidate password fails the length policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("password must be between {MIN_PASSWORD_BYTES} and {MAX_PASSWORD_BYTES} bytes")]
pub struct InvalidPassword;

/// Hashing failed inside argon2.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("password hashing failed: {message}")]
pub struct PasswordHashError {
    message: String,
}

/// Validated plaintext password.
///
/// # Examples
/// ```
/// use hestia::domain::Password;
///
/// assert!(Password::parse("short").is_err());
/// let password = Password::parse("correct horse").expect("long enough");
/// assert_eq!(format!("{password:?}"), "Password(<redacted>)");
/// ```
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Check the length policy and take ownership of the plaintext.
    pub fn parse(plain: &str) -> Result<Self, InvalidPassword> {
        if (MIN_PASSWORD_BYTES..=MAX_PASSWORD_BYTES).contains(&plain.len()) {
            Ok(Self(Zeroizing::new(plain.to_owned())))
        } else {
            Err(InvalidPassword)
        }
    }

    /// Produce an argon2id PHC string with a fresh random salt.
    pub fn hash(&self) -> Result<String, PasswordHashError> {
        let mut salt_bytes = [0_u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|err| PasswordHashError {
            message: err.to_string(),
        })?;
        Argon2::default()
            .hash_password(self.0.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHashError {
                message: err.to_string(),
            })
    }

    /// `true` when this plaintext produced `hash`. Malformed hashes never match.
    #[must_use]
    pub fn matches(&self, hash: &str) -> bool {
        PasswordHash::new(hash)
            .is_ok_and(|parsed| Argon2::default().verify_password(self.0.as_bytes(), &parsed).is_ok())
    }

    /// [`Password::hash`] on the blocking thread pool.
    pub async fn hash_blocking(&self) -> Result<String, PasswordHashError> {
        let password = self.clone();
        tokio::task::spawn_blocking(move || password.hash())
            .await
            .map_err(|err| PasswordHashError {
                message: err.to_string(),
            })?
    }

    /// [`Password::matches`] on the blocking thread pool. A verifier that
    /// panics counts as a mismatch.
    pub async fn matches_blocking(&self, hash: &str) -> bool {
        let password = self.clone();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || password.matches(&hash))
            .await
            .unwrap_or(false)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password({REDACTED})")
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("seven77")]
    fn rejects_short_passwords(#[case] plain: &str) {
        assert_eq!(Password::parse(plain).map(|_| ()), Err(InvalidPassword));
    }

    #[rstest]
    fn rejects_overlong_passwords() {
        let plain = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(Password::parse(&plain).is_err());
    }

    #[rstest]
    #[case("eight888")]
    #[case(&"y".repeat(MAX_PASSWORD_BYTES))]
    fn accepts_boundary_lengths(#[case] plain: &str) {
        assert!(Password::parse(plain).is_ok());
    }

    #[rstest]
    fn hash_verifies_only_the_original_plaintext() {
        let password = Password::parse("correct horse").expect("valid password");
        let hash = password.hash().expect("hashing succeeds");
        assert!(hash.starts_with("$argon2id$"));
        assert!(password.matches(&hash));
        let other = Password::parse("battery staple").expect("valid password");
        assert!(!other.matches(&hash));
    }

    #[rstest]
    #[tokio::test]
    async fn blocking_variants_agree_with_inline_ones() {
        let password = Password::parse("correct horse").expect("valid password");
        let hash = password.hash_blocking().await.expect("hashing succeeds");
        assert!(password.matches(&hash));
        assert!(password.matches_blocking(&hash).await);
        let other = Password::parse("battery staple").expect("valid password");
        assert!(!other.matches_blocking(&hash).await);
    }

    #[rstest]
    fn malformed_hash_never_matches() {
        let password = Password::parse("correct horse").expect("valid password");
        assert!(!password.matches("not-a-phc-string"));
    }

    #[rstest]
    fn formatting_hides_plaintext() {
        let password = Password::parse("correct horse").expect("valid password");
        assert_eq!(password.to_string(), REDACTED);
        assert!(!format!("{password:?}").contains("horse"));
    }
}

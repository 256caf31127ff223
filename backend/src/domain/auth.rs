//! Login and registration inputs.
//!
//! Handlers parse raw request strings into these types before calling a
//! service, so services only ever see validated values.

use thiserror::Error;
use zeroize::Zeroizing;

use super::{InvalidPassword, Password};

/// Raw inputs failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Registration password fails the length policy.
    #[error(transparent)]
    InvalidPassword(#[from] InvalidPassword),
}

/// Credentials presented at login.
///
/// Login deliberately skips the length policy: a stored hash either matches
/// or it does not.
///
/// # Examples
/// ```
/// use hestia::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.com ", "pw").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = normalise_email(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Trimmed email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Plaintext password as supplied.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// A validated registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    email: String,
    password: Password,
}

impl Registration {
    /// Construct a registration, enforcing the password policy.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = normalise_email(email)?;
        let password = Password::parse(password)?;
        Ok(Self { email, password })
    }

    /// Trimmed email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Policy-checked password.
    #[must_use]
    pub const fn password(&self) -> &Password {
        &self.password
    }
}

fn normalise_email(raw: &str) -> Result<String, CredentialsValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(CredentialsValidationError::EmptyEmail)
    } else {
        Ok(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", CredentialsValidationError::EmptyEmail)]
    #[case("   ", "pw", CredentialsValidationError::EmptyEmail)]
    #[case("ada@example.com", "", CredentialsValidationError::EmptyPassword)]
    fn invalid_login(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialsValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password).expect_err("invalid inputs");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn login_keeps_password_whitespace() {
        let creds = LoginCredentials::try_from_parts("ada@example.com", " pw ").expect("valid");
        assert_eq!(creds.password(), " pw ");
    }

    #[rstest]
    #[case("ada@example.com", "short", CredentialsValidationError::InvalidPassword(InvalidPassword))]
    #[case(" ", "long enough", CredentialsValidationError::EmptyEmail)]
    fn invalid_registration(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialsValidationError,
    ) {
        let err = Registration::try_from_parts(email, password).expect_err("invalid inputs");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn registration_trims_email() {
        let reg = Registration::try_from_parts(" ada@example.com", "long enough").expect("valid");
        assert_eq!(reg.email(), "ada@example.com");
    }
}

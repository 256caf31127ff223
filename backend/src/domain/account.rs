//! Account entity and its query/update value objects.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Opaque account identifier.
///
/// Identifiers are minted as positive decimal integers so that
/// `/resource/{id}` paths collapse onto their collection route during
/// authorization. The store treats them as opaque text.
///
/// # Examples
/// ```
/// use hestia::domain::AccountId;
///
/// let id = AccountId::generate();
/// assert!(id.as_str().bytes().all(|b| b.is_ascii_digit()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap an existing identifier without validation.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mint a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_numeric_id())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty identifier, which the store refuses to create.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn random_numeric_id() -> String {
    rand::thread_rng().gen_range(1..=i64::MAX).to_string()
}

/// Persisted account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Store-unique identifier.
    pub id: AccountId,
    /// Store-unique email address.
    pub email: String,
    /// PHC-formatted password hash. Never the plaintext.
    pub password_hash: String,
    /// Free-text role label such as `admin` or `user`.
    pub role: String,
    /// Inactive accounts cannot log in or request password resets.
    pub is_active: bool,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

/// AND-combined predicate for account lookups.
///
/// Empty collections and `None` leave the corresponding column
/// unconstrained.
///
/// # Examples
/// ```
/// use hestia::domain::AccountFilter;
///
/// let filter = AccountFilter::default()
///     .with_emails(["ada@example.com"])
///     .with_active(true);
/// assert_eq!(filter.emails, vec!["ada@example.com".to_owned()]);
/// assert_eq!(filter.active, Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    /// Match any of these identifiers.
    pub ids: Vec<AccountId>,
    /// Match any of these email addresses.
    pub emails: Vec<String>,
    /// Match only active (`Some(true)`) or inactive (`Some(false)`) accounts.
    pub active: Option<bool>,
}

impl AccountFilter {
    /// Restrict to the given identifiers.
    #[must_use]
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = AccountId>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }

    /// Restrict to the given email addresses.
    #[must_use]
    pub fn with_emails<S: Into<String>>(mut self, emails: impl IntoIterator<Item = S>) -> Self {
        self.emails = emails.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict on the active flag.
    #[must_use]
    pub const fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

/// Partial update of an account.
///
/// `Some` sets the column, whatever the value; `None` leaves it untouched.
/// `updated_at` is always refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccountUpdate {
    /// New email address.
    pub email: Option<String>,
    /// New role label.
    pub role: Option<String>,
    /// New password hash.
    #[serde(skip)]
    pub password_hash: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

impl AccountUpdate {
    /// `true` when no column besides `updated_at` would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.role.is_none()
            && self.password_hash.is_none()
            && self.is_active.is_none()
    }
}

//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only reach the domain
//! through the services it carries.

use crate::domain::{AccountService, ListingService, PasswordResetService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration, login and account administration.
    pub accounts: AccountService,
    /// Listing management and import.
    pub listings: ListingService,
    /// Password-reset requests.
    pub password_resets: PasswordResetService,
}

impl HttpState {
    /// Bundle the services.
    #[must_use]
    pub const fn new(
        accounts: AccountService,
        listings: ListingService,
        password_resets: PasswordResetService,
    ) -> Self {
        Self {
            accounts,
            listings,
            password_resets,
        }
    }
}

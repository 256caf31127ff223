//! Domain primitives, services and ports.
//!
//! Purpose: hold everything that is independent of HTTP and PostgreSQL.
//! Entities and their filter/update value objects, the token manager and
//! interceptor, the background task registry, and the services that drive
//! the [`ports`].
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic failure payload.
//! - `Account`, `Listing`, `EmailToken` and their identifiers, filters and
//!   updates.
//! - `TokenManager`, `RoutePolicy`, `Interceptor`: access control.
//! - `AccountService`, `ListingService`, `PasswordResetService`: use cases.

pub mod account;
pub mod account_service;
pub mod auth;
pub mod background;
pub mod email_token;
pub mod error;
pub mod interceptor;
pub mod listing;
pub mod listing_service;
pub mod password;
pub mod password_reset_service;
pub mod ports;
pub mod route_policy;
pub mod timestamp;
pub mod token;
pub mod trace_id;

pub use self::account::{Account, AccountFilter, AccountId, AccountUpdate};
pub use self::account_service::{AccountService, NewAccount};
pub use self::auth::{CredentialsValidationError, LoginCredentials, Registration};
pub use self::background::{BackgroundTasks, DrainOutcome};
pub use self::email_token::{EmailToken, RawEmailToken, TokenPurpose};
pub use self::error::{Error, ErrorCode};
pub use self::interceptor::{AuthRejection, Interceptor, bearer_token};
pub use self::listing::{Listing, ListingDraft, ListingFilter, ListingId, ListingUpdate};
pub use self::listing_service::ListingService;
pub use self::password::{InvalidPassword, Password, PasswordHashError};
pub use self::password_reset_service::{
    PASSWORD_RESET_TEMPLATE, PASSWORD_RESET_TIMEOUT, PASSWORD_RESET_TOKEN_LIFETIME,
    PasswordResetService,
};
pub use self::route_policy::{ROLE_ADMIN, ROLE_USER, RoutePolicy, normalize_route};
pub use self::timestamp::stored_now;
pub use self::token::{
    Claims, InvalidTokenReason, TokenError, TokenManager, TokenSecret, TokenSettings,
    TokenSettingsError,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

//! HTTP inbound adapter exposing the REST API.
//!
//! [`configure`] mounts every route: the `auth` scope is public, everything
//! else under `/api/v1` passes through [`BearerAuth`] first.

pub mod accounts;
pub mod auth;
pub mod bearer;
pub mod error;
pub mod health;
pub mod listings;
pub mod state;

use actix_web::web;
use serde_json::json;

pub use bearer::{BearerAuth, Caller};
pub use error::ApiResult;
pub use state::HttpState;

use crate::domain::{CredentialsValidationError, Error, Interceptor};

/// Register the API routes and extractor configuration on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig, interceptor: Interceptor) {
    cfg.app_data(error::json_config())
        .app_data(error::query_config())
        .service(
            web::scope("/api/v1/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::request_password_reset)
                .service(auth::confirm_password_reset),
        )
        .service(
            web::scope("/api/v1")
                .wrap(BearerAuth::new(interceptor))
                .service(accounts::list_accounts)
                .service(accounts::create_account)
                .service(accounts::get_account)
                .service(accounts::update_account)
                .service(accounts::delete_account)
                .service(listings::list_listings)
                .service(listings::create_listing)
                .service(listings::import_listing)
                .service(listings::get_listing)
                .service(listings::update_listing)
                .service(listings::delete_listing),
        );
}

/// Credential validation failure with the offending field in `details`.
pub(crate) fn credentials_error(err: CredentialsValidationError) -> Error {
    let field = match err {
        CredentialsValidationError::EmptyEmail => "email",
        CredentialsValidationError::EmptyPassword | CredentialsValidationError::InvalidPassword(_) => {
            "password"
        }
    };
    Error::from(err).with_details(json!({ "field": field }))
}

//! Registration, login and password-reset handlers.
//!
//! These routes sit outside the bearer-protected scope.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"ada@example.com","password":"correct horse"}
//! POST /api/v1/auth/login {"email":"ada@example.com","password":"correct horse"}
//! POST /api/v1/auth/password-reset {"email":"ada@example.com"}
//! POST /api/v1/auth/password-reset/confirm {"id":"42","token":"9f…","password":"battery staple"}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{LoginCredentials, Password, Registration};

use super::accounts::AccountResponse;
use super::{ApiResult, HttpState, credentials_error};

/// Email and password pair.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Signed bearer token returned by login.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of `POST /api/v1/auth/password-reset`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Body of `POST /api/v1/auth/password-reset/confirm`: the mailed token and
/// the new password.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordResetConfirmation {
    pub id: String,
    pub token: String,
    pub password: String,
}

/// Create an active account with the default role.
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from_parts(&payload.email, &payload.password)
        .map_err(credentials_error)?;
    let account = state.accounts.register(&registration).await?;
    Ok(HttpResponse::Created().json(AccountResponse::from(account)))
}

/// Exchange credentials for a bearer token.
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(credentials_error)?;
    let token = state.accounts.login(&credentials).await?;
    Ok(web::Json(TokenResponse { token }))
}

/// Queue a password-reset email. Always accepted, whether or not the
/// address belongs to an account.
#[post("/password-reset")]
pub async fn request_password_reset(
    state: web::Data<HttpState>,
    payload: web::Json<PasswordResetRequest>,
) -> HttpResponse {
    state.password_resets.request(&payload.email);
    HttpResponse::Accepted().finish()
}

/// Redeem a mailed reset token and set a new password.
#[post("/password-reset/confirm")]
pub async fn confirm_password_reset(
    state: web::Data<HttpState>,
    payload: web::Json<PasswordResetConfirmation>,
) -> ApiResult<HttpResponse> {
    let password = Password::parse(&payload.password)?;
    state
        .password_resets
        .confirm(&payload.id, &payload.token, &password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

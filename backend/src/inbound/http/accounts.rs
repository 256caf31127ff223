//! Account administration handlers.
//!
//! ```text
//! GET    /api/v1/accounts?ids=1,2&emails=a@b.c&active=true
//! POST   /api/v1/accounts {"email","password","role","isActive"}
//! GET    /api/v1/accounts/{id}
//! PUT    /api/v1/accounts/{id} {"email"?,"role"?,"isActive"?,"password"?}
//! DELETE /api/v1/accounts/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Account, AccountFilter, AccountId, AccountUpdate, NewAccount, Password, Registration};

use super::{ApiResult, Caller, HttpState, credentials_error};

/// Account as shown to clients; the password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email,
            role: account.role,
            is_active: account.is_active,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Query string for `GET /api/v1/accounts`. Lists are comma-separated.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AccountQuery {
    pub ids: Option<String>,
    pub emails: Option<String>,
    pub active: Option<bool>,
}

impl From<AccountQuery> for AccountFilter {
    fn from(query: AccountQuery) -> Self {
        Self {
            ids: split_list(query.ids.as_deref())
                .map(AccountId::new)
                .collect(),
            emails: split_list(query.emails.as_deref()).map(str::to_owned).collect(),
            active: query.active,
        }
    }
}

/// Split a comma-separated query value, dropping blanks.
pub(super) fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

/// Body of `POST /api/v1/accounts`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewAccountRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Body of `PUT /api/v1/accounts/{id}`. Absent fields are left alone.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

/// List accounts matching the query.
#[get("/accounts")]
pub async fn list_accounts(
    state: web::Data<HttpState>,
    query: web::Query<AccountQuery>,
) -> ApiResult<web::Json<Vec<AccountResponse>>> {
    let filter = AccountFilter::from(query.into_inner());
    let accounts = state.accounts.list(&filter).await?;
    Ok(web::Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// Create an account with an explicit role.
#[post("/accounts")]
pub async fn create_account(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<NewAccountRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let checked =
        Registration::try_from_parts(&payload.email, &payload.password).map_err(credentials_error)?;
    let new_account = NewAccount {
        email: checked.email().to_owned(),
        password: checked.password().clone(),
        role: payload.role,
        is_active: payload.is_active.unwrap_or(true),
    };
    let account = state.accounts.create(&new_account).await?;
    caller.audit("account.create", account.id.as_str());
    Ok(HttpResponse::Created().json(AccountResponse::from(account)))
}

/// Fetch one account.
#[get("/accounts/{id}")]
pub async fn get_account(
    state: web::Data<HttpState>,
    id: web::Path<String>,
) -> ApiResult<web::Json<AccountResponse>> {
    let account = state.accounts.get(&AccountId::new(id.into_inner())).await?;
    Ok(web::Json(account.into()))
}

/// Apply a partial update.
#[put("/accounts/{id}")]
pub async fn update_account(
    state: web::Data<HttpState>,
    caller: Caller,
    id: web::Path<String>,
    payload: web::Json<UpdateAccountRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let UpdateAccountRequest {
        email,
        role,
        is_active,
        password,
    } = payload.into_inner();
    let password = password.as_deref().map(Password::parse).transpose()?;
    let update = AccountUpdate {
        email,
        role,
        password_hash: None,
        is_active,
    };
    let account = state
        .accounts
        .update_with_password(&AccountId::new(id.into_inner()), update, password.as_ref())
        .await?;
    caller.audit("account.update", account.id.as_str());
    Ok(web::Json(account.into()))
}

/// Remove an account.
#[delete("/accounts/{id}")]
pub async fn delete_account(
    state: web::Data<HttpState>,
    caller: Caller,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = AccountId::new(id.into_inner());
    state.accounts.delete(&id).await?;
    caller.audit("account.delete", id.as_str());
    Ok(HttpResponse::NoContent().finish())
}

//! HTTP rendering of domain errors.
//!
//! The domain [`Error`] stays transport-agnostic; this module picks the
//! status code, echoes the trace id header and hides internal messages from
//! clients. Extractor failures (malformed JSON, bad query strings) are
//! folded into the same envelope.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode, web};
use serde_json::json;
use tracing::error;

use crate::domain::{AuthRejection, Error, ErrorCode, TRACE_ID_HEADER};

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    let redacted = Error::internal("Internal server error");
    match error.trace_id() {
        Some(id) => redacted.with_trace_id(id.to_owned()),
        None => redacted,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Self::internal("Internal server error")
    }
}

/// Map an interceptor rejection. Missing or bad credentials are
/// `unauthorized`; valid credentials without access are `forbidden`.
pub fn rejection_error(rejection: &AuthRejection) -> Error {
    match rejection {
        AuthRejection::MissingToken | AuthRejection::InvalidToken(_) => {
            Error::unauthorized(rejection.to_string())
        }
        AuthRejection::UnknownRoute | AuthRejection::RoleNotPermitted => {
            Error::forbidden(rejection.to_string())
        }
    }
}

/// JSON extractor configuration rendering body errors as `invalid_request`.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        Error::invalid_request("malformed request body")
            .with_details(json!({ "reason": err.to_string() }))
            .into()
    })
}

/// Query extractor configuration rendering parse errors as `invalid_request`.
#[must_use]
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        Error::invalid_request("malformed query string")
            .with_details(json!({ "reason": err.to_string() }))
            .into()
    })
}

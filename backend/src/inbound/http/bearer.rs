//! Bearer-token access control for protected scopes.
//!
//! [`BearerAuth`] hands each request to the domain [`Interceptor`] before any
//! handler or extractor runs. Rejected requests are answered directly; an
//! accepted request carries the token subject in its extensions, where the
//! [`Caller`] extractor finds it.

use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::info;

use crate::domain::{AccountId, Error, Interceptor, bearer_token};

use super::error::rejection_error;

/// Identity of the authorised caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub AccountId);

impl Caller {
    /// Log that this caller performed `action` on the record `target`.
    pub fn audit(&self, action: &'static str, target: &str) {
        info!(actor = %self.0, action, target, "audit");
    }
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Self>()
                .cloned()
                .ok_or_else(|| Error::unauthorized("missing bearer token")),
        )
    }
}

/// Middleware factory enforcing an [`Interceptor`].
///
/// # Examples
/// ```ignore
/// use actix_web::web;
/// use hestia::inbound::http::bearer::BearerAuth;
///
/// let scope = web::scope("/api/v1").wrap(BearerAuth::new(interceptor));
/// ```
#[derive(Clone)]
pub struct BearerAuth {
    interceptor: Interceptor,
}

impl BearerAuth {
    /// Guard a scope with `interceptor`.
    #[must_use]
    pub const fn new(interceptor: Interceptor) -> Self {
        Self { interceptor }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service,
            interceptor: self.interceptor.clone(),
        }))
    }
}

/// Service produced by [`BearerAuth`].
pub struct BearerAuthMiddleware<S> {
    service: S,
    interceptor: Interceptor,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let decision = {
            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok());
            let target = req
                .uri()
                .path_and_query()
                .map_or_else(|| req.path(), |target| target.as_str());
            self.interceptor.authorize(target, bearer_token(header))
        };

        match decision {
            Ok(subject) => {
                req.extensions_mut().insert(Caller(subject));
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(rejection) => {
                let response = rejection_error(&rejection).error_response();
                Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ROLE_ADMIN, ROLE_USER, RoutePolicy, TRACE_ID_HEADER};
    use crate::middleware::Trace;
    use crate::test_support::{TokenFixture, account_fixture};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    #[fixture]
    fn tokens() -> TokenFixture {
        TokenFixture::new()
    }

    async fn call(tokens: &TokenFixture, uri: &str, token: Option<String>) -> (StatusCode, String) {
        let interceptor = Interceptor::new(tokens.manager(), Arc::new(RoutePolicy::standard()));
        let app = actix_test::init_service(
            App::new().wrap(Trace).service(
                web::scope("/api/v1")
                    .wrap(BearerAuth::new(interceptor))
                    .route(
                        "/{tail:.*}",
                        web::get().to(|caller: Caller| async move {
                            HttpResponse::Ok().body(caller.0.to_string())
                        }),
                    ),
            ),
        )
        .await;
        let mut req = actix_test::TestRequest::get().uri(uri);
        if let Some(token) = token {
            req = req.insert_header((AUTHORIZATION, format!("Bearer {token}")));
        }
        let res = actix_test::call_service(&app, req.to_request()).await;
        let status = res.status();
        assert!(res.headers().contains_key(TRACE_ID_HEADER));
        let body = actix_test::read_body(res).await;
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[rstest]
    #[actix_web::test]
    async fn authorised_callers_reach_the_handler(tokens: TokenFixture) {
        let token = tokens.issue(&account_fixture("77", "ada@example.com", ROLE_USER));
        let (status, body) = call(&tokens, "/api/v1/listings/12?page=2", Some(token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "77");
    }

    #[rstest]
    #[case::missing_token("/api/v1/listings", None, StatusCode::UNAUTHORIZED)]
    #[case::unknown_route("/api/v1/reports", Some(ROLE_ADMIN), StatusCode::FORBIDDEN)]
    #[case::role_not_permitted("/api/v1/accounts/5", Some(ROLE_USER), StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn rejections_are_answered_before_the_handler(
        tokens: TokenFixture,
        #[case] uri: &str,
        #[case] role: Option<&str>,
        #[case] expected: StatusCode,
    ) {
        let token = role.map(|role| tokens.issue(&account_fixture("5", "bo@example.com", role)));
        let (status, _) = call(&tokens, uri, token).await;
        assert_eq!(status, expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn tampered_tokens_are_unauthorised(tokens: TokenFixture) {
        let mut token = tokens.issue(&account_fixture("5", "bo@example.com", ROLE_ADMIN));
        token.push('x');
        let (status, body) = call(&tokens, "/api/v1/accounts", Some(token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("invalid token"));
    }
}

//! Per-request authorization decision.
//!
//! A request moves through four checks in a fixed order and stops at the
//! first failure:
//!
//! 1. a bearer token is present;
//! 2. the normalised route has a policy entry;
//! 3. the token verifies;
//! 4. the token's role is on the route's allow-list.
//!
//! The decision is pure and synchronous. Nothing is retried.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::{AccountId, RoutePolicy, TokenError, TokenManager, normalize_route};

/// Why a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthRejection {
    /// No bearer token accompanied the request.
    #[error("missing bearer token")]
    MissingToken,
    /// The route has no policy entry.
    #[error("no permission to access this route")]
    UnknownRoute,
    /// Token verification failed.
    #[error("invalid token")]
    InvalidToken(#[source] TokenError),
    /// The token's role is not allowed on this route.
    #[error("no permission to access this route")]
    RoleNotPermitted,
}

/// Extract the credentials from an `Authorization` header value.
///
/// The scheme is matched case-insensitively. A blank token counts as absent.
///
/// # Examples
/// ```
/// use hestia::domain::bearer_token;
///
/// assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
/// assert_eq!(bearer_token(Some("Basic abc")), None);
/// assert_eq!(bearer_token(Some("Bearer ")), None);
/// assert_eq!(bearer_token(None), None);
/// ```
#[must_use]
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Enforces a [`RoutePolicy`] using a [`TokenManager`].
#[derive(Clone)]
pub struct Interceptor {
    tokens: Arc<TokenManager>,
    policy: Arc<RoutePolicy>,
}

impl Interceptor {
    /// Bind a token manager to a policy.
    pub const fn new(tokens: Arc<TokenManager>, policy: Arc<RoutePolicy>) -> Self {
        Self { tokens, policy }
    }

    /// Decide whether the holder of `token` may call `target`.
    ///
    /// `target` is the request path, optionally with a query string. On
    /// success the token's subject is returned.
    pub fn authorize(&self, target: &str, token: Option<&str>) -> Result<AccountId, AuthRejection> {
        let Some(token) = token else {
            debug!(target, "request rejected: missing token");
            return Err(AuthRejection::MissingToken);
        };

        let route = normalize_route(target);
        let Some(roles) = self.policy.roles_for(route) else {
            debug!(route, "request rejected: route has no policy");
            return Err(AuthRejection::UnknownRoute);
        };

        let claims = self.tokens.verify(token).map_err(|err| {
            debug!(route, error = %err, "request rejected: token failed verification");
            AuthRejection::InvalidToken(err)
        })?;

        if roles.contains(&claims.role) {
            Ok(claims.subject())
        } else {
            debug!(route, role = %claims.role, subject = %claims.id, "request rejected: role not permitted");
            Err(AuthRejection::RoleNotPermitted)
        }
    }
}

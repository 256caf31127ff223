//! Route to allowed-roles table.
//!
//! Keys are normalised routes: the query string is ignored and a trailing
//! numeric identifier segment is dropped, so `/api/v1/listings/42` and
//! `/api/v1/listings` share one entry.

use std::collections::{BTreeSet, HashMap};

/// Role label for administrators.
pub const ROLE_ADMIN: &str = "admin";
/// Role label for ordinary accounts.
pub const ROLE_USER: &str = "user";

/// Static route policy, built once at startup.
///
/// # Examples
/// ```
/// use hestia::domain::RoutePolicy;
///
/// let policy = RoutePolicy::default().allow("/accounts", ["admin"]);
/// assert!(policy.allows("/accounts", "admin"));
/// assert!(!policy.allows("/accounts", "user"));
/// assert!(policy.roles_for("/listings").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    routes: HashMap<String, BTreeSet<String>>,
}

impl RoutePolicy {
    /// Policy guarding the versioned API.
    #[must_use]
    pub fn standard() -> Self {
        Self::default()
            .allow("/api/v1/accounts", [ROLE_ADMIN])
            .allow("/api/v1/listings", [ROLE_ADMIN, ROLE_USER])
            .allow("/api/v1/listings/import", [ROLE_ADMIN, ROLE_USER])
    }

    /// Add `roles` to the allow-list of `route`.
    #[must_use]
    pub fn allow<S: Into<String>>(
        mut self,
        route: impl Into<String>,
        roles: impl IntoIterator<Item = S>,
    ) -> Self {
        self.routes
            .entry(route.into())
            .or_default()
            .extend(roles.into_iter().map(Into::into));
        self
    }

    /// Allowed roles for an already normalised route.
    #[must_use]
    pub fn roles_for(&self, route: &str) -> Option<&BTreeSet<String>> {
        self.routes.get(route)
    }

    /// `true` when `role` may call `route`.
    #[must_use]
    pub fn allows(&self, route: &str, role: &str) -> bool {
        self.roles_for(route).is_some_and(|roles| roles.contains(role))
    }
}

/// Reduce a request target to its policy key.
///
/// # Examples
/// ```
/// use hestia::domain::normalize_route;
///
/// assert_eq!(normalize_route("/api/v1/listings/42?x=1"), "/api/v1/listings");
/// assert_eq!(normalize_route("/api/v1/listings/import"), "/api/v1/listings/import");
/// ```
#[must_use]
pub fn normalize_route(target: &str) -> &str {
    let path = target.split_once('?').map_or(target, |(path, _)| path);
    match path.rsplit_once('/') {
        Some((parent, last)) if last.bytes().all(|b| b.is_ascii_digit()) => parent,
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/a/42", "/a")]
    #[case("/a/", "/a")]
    #[case("/a", "/a")]
    #[case("/a/b", "/a/b")]
    #[case("/a/4b", "/a/4b")]
    #[case("/a/42?sort=asc", "/a")]
    #[case("/a?x=1", "/a")]
    #[case("/a/42/", "/a/42")]
    #[case("/a/b/7", "/a/b")]
    fn normalisation_table(#[case] target: &str, #[case] expected: &str) {
        assert_eq!(normalize_route(target), expected);
    }

    #[rstest]
    fn standard_policy_matches_route_table() {
        let policy = RoutePolicy::standard();
        assert!(policy.allows("/api/v1/accounts", ROLE_ADMIN));
        assert!(!policy.allows("/api/v1/accounts", ROLE_USER));
        assert!(policy.allows("/api/v1/listings", ROLE_USER));
        assert!(policy.allows("/api/v1/listings/import", ROLE_USER));
        assert!(policy.roles_for("/api/v1/auth/login").is_none());
    }

    #[rstest]
    fn allow_accumulates_roles() {
        let policy = RoutePolicy::default()
            .allow("/x", ["admin"])
            .allow("/x", ["user"]);
        let roles: Vec<&str> = policy
            .roles_for("/x")
            .expect("route present")
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(roles, vec!["admin", "user"]);
    }
}

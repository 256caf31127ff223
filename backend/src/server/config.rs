//! HTTP server configuration object.

use hestia::domain::Interceptor;
use hestia::inbound::http::HttpState;

/// Everything [`super::create_server`] needs besides health state.
pub struct ServerConfig {
    pub(crate) bind_addr: String,
    pub(crate) state: HttpState,
    pub(crate) interceptor: Interceptor,
}

impl ServerConfig {
    /// Bundle the listen address with the handler state and interceptor.
    #[must_use]
    pub fn new(bind_addr: impl Into<String>, state: HttpState, interceptor: Interceptor) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            state,
            interceptor,
        }
    }

    /// Address the server will bind to.
    #[cfg_attr(
        not(test),
        expect(dead_code, reason = "read by tests; main logs the settings value")
    )]
    #[must_use]
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
}

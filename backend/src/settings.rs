//! Process settings loaded via OrthoConfig.
//!
//! Every value can come from CLI flags, `HESTIA_*` environment variables or
//! a configuration file. Absent values fall back to the defaults below;
//! the database URL and token secret have none and must be supplied.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_LIFETIME_MINS: u64 = 120;
const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SHUTDOWN_DRAIN_SECS: u64 = 15;
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ROLE: &str = "user";

/// A required setting was not supplied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required setting {0}")]
pub struct MissingSetting(pub &'static str);

/// Server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HESTIA")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Seconds a request may wait for a pooled connection.
    pub pool_acquire_timeout_secs: Option<u64>,
    /// HS256 signing secret.
    pub token_secret: Option<String>,
    /// Minutes an issued token stays valid.
    pub token_lifetime_mins: Option<u64>,
    /// Milliseconds each store operation may take.
    pub statement_timeout_ms: Option<u64>,
    /// Seconds to wait for background tasks at shutdown.
    pub shutdown_drain_secs: Option<u64>,
    /// Mail relay endpoint; mail is discarded when unset.
    pub mail_relay_url: Option<String>,
    /// Seconds a mail relay request may take.
    pub mail_timeout_secs: Option<u64>,
    /// Role given to self-registered accounts.
    pub default_role: Option<String>,
}

impl ServerSettings {
    /// Listen address.
    #[must_use]
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Database URL.
    ///
    /// # Errors
    /// [`MissingSetting`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, MissingSetting> {
        non_blank(self.database_url.as_deref()).ok_or(MissingSetting("database_url"))
    }

    /// Pool size.
    #[must_use]
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Pool checkout timeout.
    #[must_use]
    pub fn pool_acquire_timeout(&self) -> Duration {
        Duration::from_secs(
            self.pool_acquire_timeout_secs
                .unwrap_or(DEFAULT_POOL_ACQUIRE_TIMEOUT_SECS),
        )
    }

    /// Token signing secret.
    ///
    /// # Errors
    /// [`MissingSetting`] when unset or blank.
    pub fn token_secret(&self) -> Result<&str, MissingSetting> {
        non_blank(self.token_secret.as_deref()).ok_or(MissingSetting("token_secret"))
    }

    /// Token lifetime.
    #[must_use]
    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(
            self.token_lifetime_mins
                .unwrap_or(DEFAULT_TOKEN_LIFETIME_MINS)
                .saturating_mul(60),
        )
    }

    /// Per-operation store deadline.
    #[must_use]
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms.unwrap_or(DEFAULT_STATEMENT_TIMEOUT_MS))
    }

    /// Shutdown drain budget for background tasks.
    #[must_use]
    pub fn shutdown_drain(&self) -> Duration {
        Duration::from_secs(self.shutdown_drain_secs.unwrap_or(DEFAULT_SHUTDOWN_DRAIN_SECS))
    }

    /// Mail relay endpoint, if configured.
    #[must_use]
    pub fn mail_relay_url(&self) -> Option<&str> {
        non_blank(self.mail_relay_url.as_deref())
    }

    /// Mail relay request timeout.
    #[must_use]
    pub fn mail_timeout(&self) -> Duration {
        Duration::from_secs(self.mail_timeout_secs.unwrap_or(DEFAULT_MAIL_TIMEOUT_SECS))
    }

    /// Role for self-registration.
    #[must_use]
    pub fn default_role(&self) -> &str {
        non_blank(self.default_role.as_deref()).unwrap_or(DEFAULT_ROLE)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 11] = [
        "HESTIA_BIND_ADDR",
        "HESTIA_DATABASE_URL",
        "HESTIA_POOL_MAX_SIZE",
        "HESTIA_POOL_ACQUIRE_TIMEOUT_SECS",
        "HESTIA_TOKEN_SECRET",
        "HESTIA_TOKEN_LIFETIME_MINS",
        "HESTIA_STATEMENT_TIMEOUT_MS",
        "HESTIA_SHUTDOWN_DRAIN_SECS",
        "HESTIA_MAIL_RELAY_URL",
        "HESTIA_MAIL_TIMEOUT_SECS",
        "HESTIA_DEFAULT_ROLE",
    ];

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("hestia")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(settings.pool_max_size(), 10);
        assert_eq!(settings.pool_acquire_timeout(), Duration::from_secs(30));
        assert_eq!(settings.token_lifetime(), Duration::from_secs(120 * 60));
        assert_eq!(settings.statement_timeout(), Duration::from_secs(5));
        assert_eq!(settings.shutdown_drain(), Duration::from_secs(15));
        assert_eq!(settings.mail_relay_url(), None);
        assert_eq!(settings.default_role(), "user");
        assert_eq!(settings.database_url(), Err(MissingSetting("database_url")));
        assert_eq!(settings.token_secret(), Err(MissingSetting("token_secret")));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("HESTIA_DATABASE_URL", "postgres://db/hestia"),
            ("HESTIA_TOKEN_SECRET", "s3cret"),
            ("HESTIA_TOKEN_LIFETIME_MINS", "5"),
            ("HESTIA_STATEMENT_TIMEOUT_MS", "250"),
            ("HESTIA_MAIL_RELAY_URL", "http://relay.internal/send"),
            ("HESTIA_DEFAULT_ROLE", "tenant"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url(), Ok("postgres://db/hestia"));
        assert_eq!(settings.token_secret(), Ok("s3cret"));
        assert_eq!(settings.token_lifetime(), Duration::from_secs(300));
        assert_eq!(settings.statement_timeout(), Duration::from_millis(250));
        assert_eq!(settings.mail_relay_url(), Some("http://relay.internal/send"));
        assert_eq!(settings.default_role(), "tenant");
    }

    #[rstest]
    fn blank_values_count_as_missing() {
        let _guard = lock_env(env_with(&[
            ("HESTIA_TOKEN_SECRET", "   "),
            ("HESTIA_DEFAULT_ROLE", ""),
        ]));
        let settings = load_from_empty_args();
        assert!(settings.token_secret().is_err());
        assert_eq!(settings.default_role(), "user");
    }
}

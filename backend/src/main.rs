//! Hestia entry point: loads settings, wires adapters and serves HTTP.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use reqwest::Url;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use hestia::domain::ports::{DisabledListingImporter, DiscardingMailer, Mailer, Store};
use hestia::domain::{
    AccountService, BackgroundTasks, Interceptor, ListingService, PASSWORD_RESET_TIMEOUT,
    PasswordResetService, RoutePolicy, TokenManager, TokenSecret, TokenSettings,
};
use hestia::inbound::http::HttpState;
use hestia::inbound::http::health::HealthState;
use hestia::outbound::mail::HttpMailer;
use hestia::outbound::persistence::{DbPool, PgStore, PoolConfig};
use hestia::settings::ServerSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().map_err(startup_error)?;

    let secret = TokenSecret::new(settings.token_secret().map_err(startup_error)?.as_bytes())
        .map_err(startup_error)?;
    info!(fingerprint = %secret.fingerprint(), "token signing secret loaded");
    let token_settings =
        TokenSettings::new(secret, settings.token_lifetime()).map_err(startup_error)?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let tokens = Arc::new(TokenManager::new(token_settings, Arc::clone(&clock)));

    let pool_config = PoolConfig::new(settings.database_url().map_err(startup_error)?)
        .with_max_size(settings.pool_max_size())
        .with_acquire_timeout(settings.pool_acquire_timeout());
    let pool = DbPool::connect(&pool_config).await.map_err(startup_error)?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));

    let tasks = BackgroundTasks::default();
    let statement_timeout = settings.statement_timeout();
    let state = HttpState::new(
        AccountService::new(
            Arc::clone(&store),
            Arc::clone(&tokens),
            Arc::clone(&clock),
            statement_timeout,
            settings.default_role(),
        ),
        ListingService::new(
            Arc::clone(&store),
            Arc::new(DisabledListingImporter),
            Arc::clone(&clock),
            statement_timeout,
        ),
        PasswordResetService::new(
            store,
            build_mailer(&settings)?,
            clock,
            tasks.clone(),
            PASSWORD_RESET_TIMEOUT,
        ),
    );
    let interceptor = Interceptor::new(tokens, Arc::new(RoutePolicy::standard()));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        ServerConfig::new(settings.bind_addr(), state, interceptor),
    )?;
    info!(bind_addr = settings.bind_addr(), "server listening");
    let outcome = server.await;

    health_state.mark_unhealthy();
    let drained = tasks.drain(settings.shutdown_drain()).await;
    pool.close().await;
    info!(?drained, "shutdown complete");
    outcome
}

fn build_mailer(settings: &ServerSettings) -> std::io::Result<Arc<dyn Mailer>> {
    let Some(raw) = settings.mail_relay_url() else {
        warn!("no mail relay configured; outgoing mail is discarded");
        return Ok(Arc::new(DiscardingMailer));
    };
    let endpoint = Url::parse(raw).map_err(startup_error)?;
    let mailer = HttpMailer::new(endpoint, settings.mail_timeout()).map_err(startup_error)?;
    Ok(Arc::new(mailer))
}

fn startup_error(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

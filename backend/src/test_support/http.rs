//! In-memory wiring of the HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use super::{MemoryStore, TokenFixture};
use crate::domain::ports::{DisabledListingImporter, DiscardingMailer, ListingImporter, Mailer};
use crate::domain::{
    AccountService, BackgroundTasks, Interceptor, ListingService, PasswordResetService, ROLE_USER,
    RoutePolicy,
};
use crate::inbound::http::{self, HttpState};
use crate::middleware::Trace;

const STATEMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Services over a [`MemoryStore`] with swappable adapters.
#[derive(Clone)]
pub struct TestServices {
    /// Backing store.
    pub store: MemoryStore,
    /// Token manager and its clock.
    pub tokens: TokenFixture,
    /// Background work queued by handlers.
    pub tasks: BackgroundTasks,
    mailer: Arc<dyn Mailer>,
    importer: Arc<dyn ListingImporter>,
}

impl Default for TestServices {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServices {
    /// Empty store, discarding mailer, importer disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: MemoryStore::default(),
            tokens: TokenFixture::new(),
            tasks: BackgroundTasks::default(),
            mailer: Arc::new(DiscardingMailer),
            importer: Arc::new(DisabledListingImporter),
        }
    }

    /// Replace the mailer.
    #[must_use]
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Replace the listing importer.
    #[must_use]
    pub fn with_importer(mut self, importer: Arc<dyn ListingImporter>) -> Self {
        self.importer = importer;
        self
    }

    /// Handler state over the in-memory store.
    #[must_use]
    pub fn state(&self) -> HttpState {
        let store = Arc::new(self.store.clone());
        let clock = self.tokens.clock();
        HttpState::new(
            AccountService::new(
                store.clone(),
                self.tokens.manager(),
                clock.clone(),
                STATEMENT_TIMEOUT,
                ROLE_USER,
            ),
            ListingService::new(
                store.clone(),
                Arc::clone(&self.importer),
                clock.clone(),
                STATEMENT_TIMEOUT,
            ),
            PasswordResetService::new(
                store,
                Arc::clone(&self.mailer),
                clock,
                self.tasks.clone(),
                STATEMENT_TIMEOUT,
            ),
        )
    }

    /// Interceptor enforcing the standard route policy.
    #[must_use]
    pub fn interceptor(&self) -> Interceptor {
        Interceptor::new(self.tokens.manager(), Arc::new(RoutePolicy::standard()))
    }

    /// The full API behind the trace middleware. The app owns clones of
    /// every service, so it outlives `self`.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl actix_web::body::MessageBody + use<>>,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let state = web::Data::new(self.state());
        let interceptor = self.interceptor();
        App::new()
            .app_data(state)
            .wrap(Trace)
            .configure(|cfg| http::configure(cfg, interceptor))
    }
}

//! Driven port for importing listings from external pages.
//!
//! Importers are opaque producers: given a URL they return listing content or
//! fail. How they extract it is their own business.

use async_trait::async_trait;

use crate::domain::ListingDraft;

use super::define_port_error;

define_port_error! {
    /// Import failures.
    pub enum ListingImportError {
        /// No importer is configured for this deployment.
        Disabled => "listing import is disabled",
        /// The source page could not be fetched or parsed.
        Source { message: String } => "listing source failed: {message}",
    }
}

/// Produces listing content from a source URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingImporter: Send + Sync {
    /// Fetch and extract one listing.
    async fn import(&self, url: &str) -> Result<ListingDraft, ListingImportError>;
}

/// Importer used when none is configured; always fails with `Disabled`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledListingImporter;

#[async_trait]
impl ListingImporter for DisabledListingImporter {
    async fn import(&self, _url: &str) -> Result<ListingDraft, ListingImportError> {
        Err(ListingImportError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_importer_refuses() {
        let result = DisabledListingImporter.import("https://example.com/1").await;
        assert_eq!(result, Err(ListingImportError::Disabled));
    }
}

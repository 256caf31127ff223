//! Listing use cases.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::info;

use super::ports::{
    Deadline, ListingImportError, ListingImporter, Store, StoreError, in_unit_of_work,
};
use super::{Error, Listing, ListingDraft, ListingFilter, ListingId, ListingUpdate, stored_now};

/// Listing service over the [`Store`] and [`ListingImporter`] ports.
#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn Store>,
    importer: Arc<dyn ListingImporter>,
    clock: Arc<dyn Clock>,
    statement_timeout: Duration,
}

impl ListingService {
    /// Create a service. Every store call is bounded by `statement_timeout`.
    pub fn new(
        store: Arc<dyn Store>,
        importer: Arc<dyn ListingImporter>,
        clock: Arc<dyn Clock>,
        statement_timeout: Duration,
    ) -> Self {
        Self {
            store,
            importer,
            clock,
            statement_timeout,
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.statement_timeout)
    }

    /// Listings matching `filter`.
    pub async fn list(&self, filter: &ListingFilter) -> Result<Vec<Listing>, Error> {
        Ok(self.store.find_listings(filter, self.deadline()).await?)
    }

    /// One listing by identifier.
    pub async fn get(&self, id: &ListingId) -> Result<Listing, Error> {
        self.store
            .get_listing(id, self.deadline())
            .await
            .map_err(|err| not_found_as(err, id))
    }

    /// Store new listing content.
    pub async fn create(&self, draft: ListingDraft) -> Result<Listing, Error> {
        let listing = draft.into_listing(ListingId::generate(), stored_now(self.clock.as_ref()));
        let created = in_unit_of_work(self.store.as_ref(), self.deadline(), move |unit| {
            Box::pin(async move {
                unit.create_listing(&listing).await?;
                Ok::<_, Error>(listing)
            })
        })
        .await?;
        info!(listing_id = %created.id, "listing created");
        Ok(created)
    }

    /// Fetch listing content from `url` and store it.
    pub async fn import(&self, url: &str) -> Result<Listing, Error> {
        let draft = self.importer.import(url).await.map_err(|err| match err {
            ListingImportError::Disabled => Error::service_unavailable(err.to_string()),
            ListingImportError::Source { .. } => {
                Error::invalid_request(err.to_string()).with_details(serde_json::json!({ "url": url }))
            }
        })?;
        self.create(draft).await
    }

    /// Apply a partial update and return the stored result.
    pub async fn update(&self, id: &ListingId, update: ListingUpdate) -> Result<Listing, Error> {
        let now = stored_now(self.clock.as_ref());
        let id = id.clone();
        in_unit_of_work(self.store.as_ref(), self.deadline(), move |unit| {
            Box::pin(async move {
                unit.update_listing(&id, &update, now)
                    .await
                    .map_err(|err| not_found_as(err, &id))?;
                let mut found = unit
                    .find_listings(&ListingFilter::default().with_ids([id.clone()]))
                    .await?;
                found
                    .pop()
                    .ok_or_else(|| Error::not_found(format!("listing {id} not found")))
            })
        })
        .await
    }

    /// Remove a listing.
    pub async fn delete(&self, id: &ListingId) -> Result<(), Error> {
        let id = id.clone();
        in_unit_of_work(self.store.as_ref(), self.deadline(), move |unit| {
            Box::pin(async move {
                unit.delete_listing(&id)
                    .await
                    .map_err(|err| not_found_as(err, &id))
            })
        })
        .await
    }
}

fn not_found_as(err: StoreError, id: &ListingId) -> Error {
    match err {
        StoreError::NotFound => Error::not_found(format!("listing {id} not found")),
        other => Error::from(other),
    }
}

//! Listing entity.
//!
//! Listings are scraped rental adverts. Every content field is opaque text
//! exactly as the importer produced it; no cross-field rules apply.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::random_numeric_id;

/// Opaque listing identifier, minted like [`super::AccountId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    /// Wrap an existing identifier without validation.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mint a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_numeric_id())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty identifier.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Listing content without identity or timestamps.
///
/// This is what an importer or a client supplies when creating a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingDraft {
    pub title: String,
    pub price: String,
    pub address: String,
    pub surface: String,
    pub rooms: String,
    pub floor: String,
    pub available_from: String,
    pub rent: String,
    pub deposit: String,
    pub description: String,
}

impl ListingDraft {
    /// Stamp identity and timestamps onto the draft.
    #[must_use]
    pub fn into_listing(self, id: ListingId, now: DateTime<Utc>) -> Listing {
        Listing {
            id,
            content: self,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persisted listing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Store-unique identifier.
    pub id: ListingId,
    /// Free-text content fields.
    pub content: ListingDraft,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

/// Predicate for listing lookups. An empty `ids` set matches every listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Match any of these identifiers.
    pub ids: Vec<ListingId>,
}

impl ListingFilter {
    /// Restrict to the given identifiers.
    #[must_use]
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = ListingId>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }
}

/// Partial update of a listing; `Some` sets the column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub price: Option<String>,
    pub address: Option<String>,
    pub surface: Option<String>,
    pub rooms: Option<String>,
    pub floor: Option<String>,
    pub available_from: Option<String>,
    pub rent: Option<String>,
    pub deposit: Option<String>,
    pub description: Option<String>,
}

impl ListingUpdate {
    /// Column name and new value for every field that is set, in table order.
    #[must_use]
    pub fn assignments(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", &self.title),
            ("price", &self.price),
            ("address", &self.address),
            ("surface", &self.surface),
            ("rooms", &self.rooms),
            ("floor", &self.floor),
            ("available_from", &self.available_from),
            ("rent", &self.rent),
            ("deposit", &self.deposit),
            ("description", &self.description),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, v)))
        .collect()
    }

    /// Apply the update to in-memory content.
    pub fn apply_to(&self, content: &mut ListingDraft) {
        let targets: [(&Option<String>, &mut String); 10] = [
            (&self.title, &mut content.title),
            (&self.price, &mut content.price),
            (&self.address, &mut content.address),
            (&self.surface, &mut content.surface),
            (&self.rooms, &mut content.rooms),
            (&self.floor, &mut content.floor),
            (&self.available_from, &mut content.available_from),
            (&self.rent, &mut content.rent),
            (&self.deposit, &mut content.deposit),
            (&self.description, &mut content.description),
        ];
        for (value, slot) in targets {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
    }
}

//! Listing rows in the `listings` table.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::ports::StoreError;
use crate::domain::{Listing, ListingDraft, ListingFilter, ListingId, ListingUpdate};

use super::error_mapping::{map_build_error, map_sqlx_error};
use super::executor::{StatementExecutor, require_rows};
use super::query::{QueryBuilder, Statement};

const COLUMNS: &str = "id, title, price, address, surface, rooms, floor, available_from, rent, \
                       deposit, description, created_at, updated_at";

fn content_values(content: &ListingDraft) -> [&str; 10] {
    [
        &content.title,
        &content.price,
        &content.address,
        &content.surface,
        &content.rooms,
        &content.floor,
        &content.available_from,
        &content.rent,
        &content.deposit,
        &content.description,
    ]
    .map(String::as_str)
}

pub(super) fn insert_statement(listing: &Listing) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new(format!("INSERT INTO listings ({COLUMNS}) VALUES ("));
    query.push_param(listing.id.as_str());
    for value in content_values(&listing.content) {
        query.push(", ").push_param(value);
    }
    query
        .push(", ")
        .push_param(listing.created_at)
        .push(", ")
        .push_param(listing.updated_at)
        .push(")");
    query.build().map_err(map_build_error)
}

pub(super) fn update_statement(
    id: &ListingId,
    update: &ListingUpdate,
    now: DateTime<Utc>,
) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new("UPDATE listings SET updated_at = ");
    query.push_param(now);
    for (column, value) in update.assignments() {
        query.push(", ").push(column).push(" = ").push_param(value);
    }
    query.push(" WHERE id = ").push_param(id.as_str());
    query.build().map_err(map_build_error)
}

pub(super) fn delete_statement(id: &ListingId) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new("DELETE FROM listings WHERE id = ");
    query.push_param(id.as_str());
    query.build().map_err(map_build_error)
}

pub(super) fn find_statement(filter: &ListingFilter) -> Result<Statement, StoreError> {
    let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM listings WHERE 1=1"));
    if !filter.ids.is_empty() {
        query
            .push(" AND id IN (")
            .push_params(filter.ids.iter().map(ListingId::as_str))
            .push(")");
    }
    query.push(" ORDER BY id ASC");
    query.build().map_err(map_build_error)
}

fn from_row(row: &PgRow) -> Result<Listing, sqlx::Error> {
    Ok(Listing {
        id: ListingId::new(row.try_get::<String, _>("id")?),
        content: ListingDraft {
            title: row.try_get("title")?,
            price: row.try_get("price")?,
            address: row.try_get("address")?,
            surface: row.try_get("surface")?,
            rooms: row.try_get("rooms")?,
            floor: row.try_get("floor")?,
            available_from: row.try_get("available_from")?,
            rent: row.try_get("rent")?,
            deposit: row.try_get("deposit")?,
            description: row.try_get("description")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Insert `listing`. An empty identifier never reaches the database.
pub async fn create<E>(executor: &mut E, listing: &Listing) -> Result<(), StoreError>
where
    E: StatementExecutor + ?Sized,
{
    if listing.id.is_empty() {
        return Err(StoreError::already_exists());
    }
    executor.execute(insert_statement(listing)?).await.map(drop)
}

/// Apply `update` to the listing with `id`.
pub async fn update<E>(
    executor: &mut E,
    id: &ListingId,
    update: &ListingUpdate,
    now: DateTime<Utc>,
) -> Result<(), StoreError>
where
    E: StatementExecutor + ?Sized,
{
    let affected = executor.execute(update_statement(id, update, now)?).await?;
    require_rows(affected)
}

/// Remove the listing with `id`.
pub async fn delete<E>(executor: &mut E, id: &ListingId) -> Result<(), StoreError>
where
    E: StatementExecutor + ?Sized,
{
    let affected = executor.execute(delete_statement(id)?).await?;
    require_rows(affected)
}

/// Listings matching `filter`, ordered by identifier.
pub async fn find<E>(executor: &mut E, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError>
where
    E: StatementExecutor + ?Sized,
{
    let rows = executor.query(find_statement(filter)?).await?;
    rows.iter()
        .map(|row| from_row(row).map_err(map_sqlx_error))
        .collect()
}

/// The listing with `id`, or [`StoreError::NotFound`].
pub async fn get<E>(executor: &mut E, id: &ListingId) -> Result<Listing, StoreError>
where
    E: StatementExecutor + ?Sized,
{
    let filter = ListingFilter::default().with_ids([id.clone()]);
    find(executor, &filter)
        .await?
        .into_iter()
        .next()
        .ok_or(StoreError::NotFound)
}

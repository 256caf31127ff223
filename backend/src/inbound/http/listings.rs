//! Listing handlers.
//!
//! ```text
//! GET    /api/v1/listings?ids=1,2
//! POST   /api/v1/listings {listing draft}
//! POST   /api/v1/listings/import {"url"}
//! GET    /api/v1/listings/{id}
//! PUT    /api/v1/listings/{id} {partial listing}
//! DELETE /api/v1/listings/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Listing, ListingDraft, ListingFilter, ListingId, ListingUpdate};

use super::accounts::split_list;
use super::{ApiResult, Caller, HttpState};

/// Listing as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: String,
    #[serde(flatten)]
    pub content: ListingDraft,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id.to_string(),
            content: listing.content,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        }
    }
}

/// Query string for `GET /api/v1/listings`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListingQuery {
    pub ids: Option<String>,
}

/// Body of `POST /api/v1/listings/import`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImportRequest {
    pub url: String,
}

/// List listings, optionally restricted to some ids.
#[get("/listings")]
pub async fn list_listings(
    state: web::Data<HttpState>,
    query: web::Query<ListingQuery>,
) -> ApiResult<web::Json<Vec<ListingResponse>>> {
    let filter =
        ListingFilter::default().with_ids(split_list(query.ids.as_deref()).map(ListingId::new));
    let listings = state.listings.list(&filter).await?;
    Ok(web::Json(listings.into_iter().map(ListingResponse::from).collect()))
}

/// Create a listing from a draft.
#[post("/listings")]
pub async fn create_listing(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<ListingDraft>,
) -> ApiResult<HttpResponse> {
    let listing = state.listings.create(payload.into_inner()).await?;
    caller.audit("listing.create", listing.id.as_str());
    Ok(HttpResponse::Created().json(ListingResponse::from(listing)))
}

/// Fetch a listing from an external source and store it.
#[post("/listings/import")]
pub async fn import_listing(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<ImportRequest>,
) -> ApiResult<HttpResponse> {
    let url = payload.into_inner().url;
    if url.trim().is_empty() {
        return Err(Error::invalid_request("url must not be empty"));
    }
    let listing = state.listings.import(url.trim()).await?;
    caller.audit("listing.import", listing.id.as_str());
    Ok(HttpResponse::Created().json(ListingResponse::from(listing)))
}

/// Fetch one listing.
#[get("/listings/{id}")]
pub async fn get_listing(
    state: web::Data<HttpState>,
    id: web::Path<String>,
) -> ApiResult<web::Json<ListingResponse>> {
    let listing = state.listings.get(&ListingId::new(id.into_inner())).await?;
    Ok(web::Json(listing.into()))
}

/// Apply a partial update.
#[put("/listings/{id}")]
pub async fn update_listing(
    state: web::Data<HttpState>,
    caller: Caller,
    id: web::Path<String>,
    payload: web::Json<ListingUpdate>,
) -> ApiResult<web::Json<ListingResponse>> {
    let listing = state
        .listings
        .update(&ListingId::new(id.into_inner()), payload.into_inner())
        .await?;
    caller.audit("listing.update", listing.id.as_str());
    Ok(web::Json(listing.into()))
}

/// Remove a listing.
#[delete("/listings/{id}")]
pub async fn delete_listing(
    state: web::Data<HttpState>,
    caller: Caller,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = ListingId::new(id.into_inner());
    state.listings.delete(&id).await?;
    caller.audit("listing.delete", id.as_str());
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockListingImporter;
    use crate::domain::{ErrorCode, ROLE_USER};
    use crate::test_support::{TestServices, account_fixture};
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    fn user_bearer(services: &TestServices) -> String {
        let user = account_fixture("10", "ua@example.com", ROLE_USER);
        format!("Bearer {}", services.tokens.issue(&user))
    }

    #[rstest]
    #[actix_web::test]
    async fn users_can_create_update_and_clear_fields() {
        let services = TestServices::new();
        let bearer = user_bearer(&services);
        let app = actix_test::init_service(services.app()).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/listings")
            .insert_header((AUTHORIZATION, bearer.clone()))
            .set_json(json!({ "title": "Loft", "price": "1200", "rooms": "2" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: ListingResponse = actix_test::read_body_json(res).await;
        assert_eq!(created.content.title, "Loft");

        let req = actix_test::TestRequest::put()
            .uri(&format!("/api/v1/listings/{}", created.id))
            .insert_header((AUTHORIZATION, bearer.clone()))
            .set_json(json!({ "price": "" }))
            .to_request();
        let updated: ListingResponse = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.content.price, "");
        assert_eq!(updated.content.rooms, "2");

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/v1/listings?ids={}", created.id))
            .insert_header((AUTHORIZATION, bearer))
            .to_request();
        let listed: Vec<ListingResponse> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed, vec![updated]);
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_listing_is_not_found() {
        let services = TestServices::new();
        let bearer = user_bearer(&services);
        let app = actix_test::init_service(services.app()).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/listings/999")
            .insert_header((AUTHORIZATION, bearer))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn import_stores_the_fetched_draft() {
        let mut importer = MockListingImporter::new();
        importer
            .expect_import()
            .withf(|url| url == "https://agency.example/flat/9")
            .times(1)
            .returning(|_| {
                Ok(ListingDraft {
                    title: "Imported".to_owned(),
                    ..ListingDraft::default()
                })
            });
        let services = TestServices::new().with_importer(Arc::new(importer));
        let bearer = user_bearer(&services);
        let app = actix_test::init_service(services.app()).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/listings/import")
            .insert_header((AUTHORIZATION, bearer))
            .set_json(json!({ "url": "https://agency.example/flat/9" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(services.store.listing_count(), 1);
    }

    #[rstest]
    #[actix_web::test]
    async fn mutations_require_an_authorised_caller() {
        let services = TestServices::new();
        let app = actix_test::init_service(
            actix_web::App::new()
                .app_data(web::Data::new(services.state()))
                .service(create_listing)
                .service(delete_listing),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/listings")
            .set_json(json!({ "title": "Loft" }))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
        let req = actix_test::TestRequest::delete().uri("/listings/1").to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(services.store.listing_count(), 0);
    }

    #[rstest]
    #[actix_web::test]
    async fn disabled_importer_is_unavailable() {
        let services = TestServices::new();
        let bearer = user_bearer(&services);
        let app = actix_test::init_service(services.app()).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/listings/import")
            .insert_header((AUTHORIZATION, bearer))
            .set_json(json!({ "url": "https://agency.example/flat/9" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let payload: Error = actix_test::read_body_json(res).await;
        assert_eq!(payload.code(), ErrorCode::ServiceUnavailable);
    }
}

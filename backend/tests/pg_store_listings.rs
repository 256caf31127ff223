//! `PgStore` listing persistence against embedded PostgreSQL.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use hestia::domain::ports::{DisabledListingImporter, Store, StoreError};
use hestia::domain::{
    Listing, ListingDraft, ListingFilter, ListingId, ListingService, ListingUpdate,
};
use hestia::test_support::MutableClock;
use rstest::{fixture, rstest};

mod support;

use support::store_context::{PgContext, deadline, pg_context};

#[fixture]
fn pg() -> Option<PgContext> {
    pg_context()
}

#[fixture]
fn flat() -> Listing {
    let created = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    ListingDraft {
        title: "Two-room flat near the canal".to_owned(),
        price: "1200".to_owned(),
        address: "4 Quai de Jemmapes".to_owned(),
        surface: "48".to_owned(),
        rooms: "2".to_owned(),
        ..ListingDraft::default()
    }
    .into_listing(ListingId::new("900"), created)
}

fn insert(ctx: &PgContext, listing: &Listing) {
    ctx.block_on(async {
        let mut unit = ctx.store.begin(deadline()).await.expect("begin");
        unit.create_listing(listing).await.expect("insert listing");
        unit.commit().await.expect("commit");
    });
}

#[rstest]
fn stored_listing_reads_back(pg: Option<PgContext>, flat: Listing) {
    let Some(ctx) = pg else {
        eprintln!("SKIP-TEST-CLUSTER: stored_listing_reads_back skipped");
        return;
    };
    insert(&ctx, &flat);

    let fetched = ctx
        .block_on(ctx.store.get_listing(&flat.id, deadline()))
        .expect("listing present");
    assert_eq!(fetched, flat);
}

#[rstest]
fn update_can_clear_a_field(pg: Option<PgContext>, flat: Listing) {
    let Some(ctx) = pg else {
        eprintln!("SKIP-TEST-CLUSTER: update_can_clear_a_field skipped");
        return;
    };
    insert(&ctx, &flat);
    let update = ListingUpdate {
        price: Some(String::new()),
        rent: Some("950".to_owned()),
        ..ListingUpdate::default()
    };
    let now = flat.created_at + Duration::hours(1);

    ctx.block_on(async {
        let mut unit = ctx.store.begin(deadline()).await.expect("begin");
        unit.update_listing(&flat.id, &update, now)
            .await
            .expect("update");
        unit.commit().await.expect("commit");
    });

    let fetched = ctx
        .block_on(ctx.store.get_listing(&flat.id, deadline()))
        .expect("listing present");
    assert_eq!(fetched.content.price, "");
    assert_eq!(fetched.content.rent, "950");
    assert_eq!(fetched.content.title, flat.content.title);
    assert_eq!(fetched.updated_at, now);
}

#[rstest]
fn find_by_ids_returns_only_requested(pg: Option<PgContext>, flat: Listing) {
    let Some(ctx) = pg else {
        eprintln!("SKIP-TEST-CLUSTER: find_by_ids_returns_only_requested skipped");
        return;
    };
    let mut other = flat.clone();
    other.id = ListingId::new("100");
    insert(&ctx, &flat);
    insert(&ctx, &other);

    let all = ctx
        .block_on(ctx.store.find_listings(&ListingFilter::default(), deadline()))
        .expect("find all");
    let ids: Vec<&str> = all.iter().map(|listing| listing.id.as_str()).collect();
    assert_eq!(ids, ["100", "900"]);

    let only = ctx
        .block_on(ctx.store.find_listings(
            &ListingFilter::default().with_ids([ListingId::new("900")]),
            deadline(),
        ))
        .expect("find by id");
    assert_eq!(only, vec![flat]);
}

#[rstest]
fn missing_listing_is_not_found(pg: Option<PgContext>) {
    let Some(ctx) = pg else {
        eprintln!("SKIP-TEST-CLUSTER: missing_listing_is_not_found skipped");
        return;
    };
    let result = ctx.block_on(ctx.store.get_listing(&ListingId::new("1"), deadline()));
    assert_eq!(result, Err(StoreError::not_found()));

    let deleted = ctx.block_on(async {
        let mut unit = ctx.store.begin(deadline()).await.expect("begin");
        let deleted = unit.delete_listing(&ListingId::new("1")).await;
        unit.rollback().await.expect("rollback");
        deleted
    });
    assert_eq!(deleted, Err(StoreError::not_found()));
}

#[rstest]
fn unknown_ids_find_nothing(pg: Option<PgContext>, flat: Listing) {
    let Some(ctx) = pg else {
        eprintln!("SKIP-TEST-CLUSTER: unknown_ids_find_nothing skipped");
        return;
    };
    insert(&ctx, &flat);

    let found = ctx.block_on(ctx.store.find_listings(
        &ListingFilter::default().with_ids([ListingId::new("901")]),
        deadline(),
    ));
    assert_eq!(found, Ok(Vec::new()));
}

#[rstest]
fn empty_identifier_is_refused(pg: Option<PgContext>, flat: Listing) {
    let Some(ctx) = pg else {
        eprintln!("SKIP-TEST-CLUSTER: empty_identifier_is_refused skipped");
        return;
    };
    let mut nameless = flat;
    nameless.id = ListingId::new("");

    let result = ctx.block_on(async {
        let mut unit = ctx.store.begin(deadline()).await.expect("begin");
        let result = unit.create_listing(&nameless).await;
        unit.commit().await.expect("commit");
        result
    });
    assert_eq!(result, Err(StoreError::already_exists()));
    let all = ctx
        .block_on(ctx.store.find_listings(&ListingFilter::default(), deadline()))
        .expect("find all");
    assert!(all.is_empty());
}

#[rstest]
fn updating_a_missing_listing_is_not_found(pg: Option<PgContext>, flat: Listing) {
    let Some(ctx) = pg else {
        eprintln!("SKIP-TEST-CLUSTER: updating_a_missing_listing_is_not_found skipped");
        return;
    };
    let update = ListingUpdate {
        title: Some("Renamed".to_owned()),
        ..ListingUpdate::default()
    };
    let result = ctx.block_on(async {
        let mut unit = ctx.store.begin(deadline()).await.expect("begin");
        let result = unit.update_listing(&flat.id, &update, flat.created_at).await;
        unit.rollback().await.expect("rollback");
        result
    });
    assert_eq!(result, Err(StoreError::not_found()));
}

#[rstest]
fn service_timestamps_survive_storage(pg: Option<PgContext>, flat: Listing) {
    let Some(ctx) = pg else {
        eprintln!("SKIP-TEST-CLUSTER: service_timestamps_survive_storage skipped");
        return;
    };
    let start = Utc
        .timestamp_opt(1_780_000_000, 342_068_408)
        .single()
        .expect("valid timestamp");
    let clock = Arc::new(MutableClock::new(start));
    let service = ListingService::new(
        Arc::new(ctx.store.clone()),
        Arc::new(DisabledListingImporter),
        clock.clone(),
        std::time::Duration::from_secs(5),
    );

    let created = ctx
        .block_on(service.create(flat.content.clone()))
        .expect("created");
    let found = ctx
        .block_on(ctx.store.find_listings(
            &ListingFilter::default().with_ids([created.id.clone()]),
            deadline(),
        ))
        .expect("find created");
    assert_eq!(found, vec![created.clone()]);

    clock.advance(std::time::Duration::from_nanos(1_500_777));
    let update = ListingUpdate {
        rooms: Some("3".to_owned()),
        ..ListingUpdate::default()
    };
    let updated = ctx
        .block_on(service.update(&created.id, update))
        .expect("updated");
    let fetched = ctx
        .block_on(ctx.store.get_listing(&created.id, deadline()))
        .expect("fetch updated");
    assert_eq!(fetched, updated);
    assert!(updated.updated_at > created.updated_at);
}

//! Catalog queries against a live store.
//!
//! These tests require:
//! - `SHOPIFY_STORE` and `SHOPIFY_STOREFRONT_PUBLIC_TOKEN`
//! - A store with at least one collection holding more than two products
//!
//! Run with: cargo test -p wrapsody-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use wrapsody_integration_tests::{live_config, live_session};

#[tokio::test]
#[ignore = "Requires Shopify credentials"]
async fn test_collections_list() {
    let session = live_session(&live_config());

    let collections = session.fetch_collections().await.unwrap();
    assert!(!collections.is_empty(), "store has no collections");
    for collection in &collections {
        assert!(collection.id.resource_id().is_some());
        assert!(collection.products.len() <= 10);
    }
}

#[tokio::test]
#[ignore = "Requires Shopify credentials"]
async fn test_collection_pages_are_disjoint() {
    let session = live_session(&live_config());

    let collections = session.fetch_collections().await.unwrap();
    let collection = collections
        .iter()
        .find(|c| c.products.len() > 2)
        .expect("need a collection with more than two products");

    let first = session
        .fetch_products(&collection.id, None, 2)
        .await
        .unwrap();
    let cursor = first.next_cursor().expect("first page should have a cursor");
    let second = session
        .fetch_products(&collection.id, Some(cursor), 2)
        .await
        .unwrap();

    let first_ids: HashSet<_> = first.products.iter().map(|p| p.id.clone()).collect();
    assert!(!second.products.is_empty());
    assert!(second.products.iter().all(|p| !first_ids.contains(&p.id)));
}

#[tokio::test]
#[ignore = "Requires Shopify credentials"]
async fn test_random_product() {
    let session = live_session(&live_config());

    let product = session.random_product().await.unwrap();
    let product = product.expect("store has no products");
    assert!(product.first_variant().is_some());
}

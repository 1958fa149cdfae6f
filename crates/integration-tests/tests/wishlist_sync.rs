//! Wishlist reconciliation over HTTP.

#![allow(clippy::unwrap_used)]

use just_mart_core::{Email, Identity, ProductId};
use just_mart_integration_tests::TestBackend;
use just_mart_storefront::{FetchOutcome, Outcome, SkipReason};

const ALICE: &str = "a@x.com";

fn alice() -> Identity {
    Identity::new(Email::parse(ALICE).unwrap())
}

fn id(s: &str) -> ProductId {
    ProductId::parse(s).unwrap()
}

async fn backend() -> TestBackend {
    let backend = TestBackend::start().await;
    backend.add_product("p1", "Bicycle", 4500, "Vehicles");
    backend.add_product("p2", "Mini fridge", 6000, "Electronics");
    backend.add_product("p3", "Study table", 2500, "Furniture");
    backend
}

#[tokio::test]
async fn test_saving_twice_keeps_one_entry() {
    let backend = backend().await;
    let store = backend.storefront();
    store.sign_in(alice()).await;
    let p2 = store.product(&id("p2")).await.unwrap();

    assert_eq!(store.wishlist().add_to_wishlist(&p2).await, Outcome::Confirmed);
    assert_eq!(
        store.wishlist().add_to_wishlist(&p2).await,
        Outcome::Skipped(SkipReason::AlreadyPresent)
    );

    assert_eq!(store.wishlist().wishlist_items_count(), 1);
    assert_eq!(backend.count("POST", "/api/wishlist/a@x.com"), 1);
    assert_eq!(backend.wishlist(ALICE), vec!["p2"]);
}

#[tokio::test]
async fn test_clear_issues_one_delete_per_entry() {
    let backend = backend().await;
    backend.set_wishlist(ALICE, &["p1", "p2", "p3"]);
    let store = backend.storefront();
    store.sign_in(alice()).await;

    assert_eq!(store.wishlist().clear_wishlist().await, Outcome::Confirmed);
    for product in ["p1", "p2", "p3"] {
        assert_eq!(
            backend.count("DELETE", &format!("/api/wishlist/a@x.com/{product}")),
            1
        );
    }
    assert!(backend.wishlist(ALICE).is_empty());
}

#[tokio::test]
async fn test_partial_clear_failure_restores_snapshot() {
    let backend = backend().await;
    backend.set_wishlist(ALICE, &["p1", "p2", "p3"]);
    let store = backend.storefront();
    store.sign_in(alice()).await;
    let before = store.wishlist().state().items().to_vec();

    backend.fail("DELETE", "/api/wishlist/a@x.com/p3");
    assert_eq!(store.wishlist().clear_wishlist().await, Outcome::RolledBack);
    assert_eq!(store.wishlist().state().items(), before.as_slice());
    assert_eq!(backend.wishlist(ALICE), vec!["p3"]);

    // The next fetch settles the difference
    let (_, wishlist) = store.refresh().await;
    assert_eq!(wishlist, FetchOutcome::Synced(1));
    assert!(store.wishlist().is_in_wishlist(&id("p3")));
}

#[tokio::test]
async fn test_toggle_round_trip() {
    let backend = backend().await;
    let store = backend.storefront();
    store.sign_in(alice()).await;
    let p1 = store.product(&id("p1")).await.unwrap();

    assert_eq!(store.wishlist().toggle_wishlist(&p1).await, Outcome::Confirmed);
    assert_eq!(backend.wishlist(ALICE), vec!["p1"]);
    assert_eq!(store.wishlist().toggle_wishlist(&p1).await, Outcome::Confirmed);
    assert!(backend.wishlist(ALICE).is_empty());
    assert!(!store.wishlist().is_in_wishlist(&id("p1")));
}

#[tokio::test]
async fn test_failed_remove_keeps_entry() {
    let backend = backend().await;
    backend.set_wishlist(ALICE, &["p1", "p2"]);
    let store = backend.storefront();
    store.sign_in(alice()).await;

    backend.fail("DELETE", "/api/wishlist/a@x.com/p1");
    assert_eq!(
        store.wishlist().remove_from_wishlist(&id("p1")).await,
        Outcome::RolledBack
    );
    let state = store.wishlist().state();
    let ids: Vec<&str> = state
        .items()
        .iter()
        .map(|entry| entry.product_id().as_str())
        .collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

//! Wishlist commands.

use serde_json::json;

use super::{CliResult, Store, parse_id, print_json, report};

pub fn show(store: &Store) -> CliResult {
    let wishlist = store.wishlist();
    let state = wishlist.state();
    print_json(&json!({
        "status": format!("{:?}", state.status()),
        "items": state.items(),
        "count": wishlist.wishlist_items_count(),
    }))
}

pub async fn add(store: &Store, id: &str) -> CliResult {
    let product = store.product(&parse_id(id)?).await?;
    report("wishlist add", store.wishlist().add_to_wishlist(&product).await)
}

pub async fn remove(store: &Store, id: &str) -> CliResult {
    report(
        "wishlist remove",
        store.wishlist().remove_from_wishlist(&parse_id(id)?).await,
    )
}

pub async fn toggle(store: &Store, id: &str) -> CliResult {
    let product = store.product(&parse_id(id)?).await?;
    report(
        "wishlist toggle",
        store.wishlist().toggle_wishlist(&product).await,
    )
}

pub async fn clear(store: &Store) -> CliResult {
    report("wishlist clear", store.wishlist().clear_wishlist().await)
}

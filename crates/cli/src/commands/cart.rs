//! Cart commands.

use serde_json::json;

use super::{CliResult, Store, parse_id, print_json, report};

pub fn show(store: &Store) -> CliResult {
    let cart = store.cart();
    let state = cart.state();
    print_json(&json!({
        "status": format!("{:?}", state.status()),
        "items": state.items(),
        "count": cart.cart_items_count(),
        "total": cart.cart_total(),
    }))
}

pub async fn add(store: &Store, id: &str) -> CliResult {
    let product = store.product(&parse_id(id)?).await?;
    report("cart add", store.cart().add_to_cart(&product).await)
}

pub async fn remove(store: &Store, id: &str) -> CliResult {
    report(
        "cart remove",
        store.cart().remove_from_cart(&parse_id(id)?).await,
    )
}

pub async fn set(store: &Store, id: &str, quantity: i64) -> CliResult {
    report(
        "cart set",
        store.cart().update_quantity(&parse_id(id)?, quantity).await,
    )
}

pub async fn clear(store: &Store) -> CliResult {
    report("cart clear", store.cart().clear_cart().await)
}

//! Orders and checkout.

use tracing::info;

use super::{CliResult, Store, print_json};

pub async fn list(store: &Store) -> CliResult {
    let orders = store.orders().await?;
    print_json(&orders)
}

pub async fn checkout(store: &Store, address: &str) -> CliResult {
    let order = store.checkout(address).await?;
    info!(order_id = %order.order_id, "Checkout complete");
    print_json(&order)
}

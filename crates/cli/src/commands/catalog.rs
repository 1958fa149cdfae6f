//! Catalog browsing.

use super::{CliResult, Store, parse_id, print_json};

pub async fn list(store: &Store) -> CliResult {
    let products = store.products().await?;
    tracing::debug!(count = products.len(), "Listed products");
    print_json(&products)
}

pub async fn show(store: &Store, id: &str) -> CliResult {
    let product = store.product(&parse_id(id)?).await?;
    print_json(&product)
}

pub async fn categories(store: &Store) -> CliResult {
    print_json(&store.categories().await?)
}

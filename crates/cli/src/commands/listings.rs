//! Seller listings.

use just_mart_core::{NewListing, Price};
use tracing::info;

use super::{CliResult, Store, parse_id, print_json};

/// Listing fields as given on the command line.
pub struct ListingArgs {
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub condition: String,
    pub location: String,
    pub stock: u32,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

impl ListingArgs {
    fn into_listing(self) -> Result<NewListing, Box<dyn std::error::Error>> {
        let price: Price = serde_json::from_value(serde_json::Value::String(self.price))
            .map_err(|e| format!("invalid price: {e}"))?;
        Ok(NewListing {
            title: self.title,
            description: self.description,
            price,
            category: self.category,
            condition: self.condition,
            location: self.location,
            stock: self.stock,
            tags: self.tags,
            images: self.images,
        })
    }
}

pub async fn mine(store: &Store) -> CliResult {
    print_json(&store.my_listings().await?)
}

pub async fn create(store: &Store, args: ListingArgs) -> CliResult {
    let product_id = store.list_item(args.into_listing()?).await?;
    info!(product_id = %product_id, "Listing is live");
    print_json(&serde_json::json!({ "productId": product_id }))
}

pub async fn delete(store: &Store, id: &str) -> CliResult {
    let id = parse_id(id)?;
    store.delete_listing(&id).await?;
    print_json(&serde_json::json!({ "deleted": id }))
}

//! Marketplace backend API.
//!
//! # Architecture
//!
//! - [`MarketApi`] is the seam between the reconcilers and the network. The
//!   production implementation is [`MarketClient`] (`reqwest` + JSON); tests
//!   substitute in-memory backends.
//! - The backend is source of truth for carts, wishlists and orders. Product
//!   records are cached in memory via `moka` (5 minute TTL by default).
//! - Every path is built by the [`Endpoints`] catalog from a configurable
//!   base URL.
//!
//! # Example
//!
//! ```rust,ignore
//! use just_mart_storefront::api::{MarketApi, MarketClient};
//!
//! let client = MarketClient::new(&config)?;
//! let product = client.get_product(&product_id).await?;
//! client.add_cart_item(&email, &CartLineRef { product_id, quantity: 1 }).await?;
//! ```

mod cache;
mod client;
pub mod endpoints;

use std::future::Future;

use just_mart_core::{
    CartLineRef, Email, ListingDraft, Order, OrderDraft, OrderId, Product, ProductId, Profile,
    WishlistEntryRef,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::{MarketClient, REQUEST_ID_HEADER};
pub use endpoints::Endpoints;

/// Errors that can occur when talking to the marketplace backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A URL could not be built from the configured base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the backend was reached and rejected the request.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::NotFound(_))
    }
}

/// Operations the storefront needs from the marketplace backend.
///
/// Mutations only report success or failure; the backend's response body is
/// never trusted as the new client state.
pub trait MarketApi: Send + Sync + 'static {
    /// `GET /api/products/{id}`
    fn get_product(&self, id: &ProductId)
    -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// `GET /api/products`
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// `GET /api/categories`
    fn list_categories(&self) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// `POST /api/products`, returning the new listing's id.
    fn create_product(
        &self,
        draft: &ListingDraft,
    ) -> impl Future<Output = Result<ProductId, ApiError>> + Send;

    /// `DELETE /api/products/{id}`
    fn delete_product(&self, id: &ProductId)
    -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET /api/users/{email}`. `None` when the user has no profile yet.
    fn get_profile(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<Profile>, ApiError>> + Send;

    /// `PUT /api/users/{email}` with `{profile}`
    fn update_profile(
        &self,
        email: &Email,
        profile: &Profile,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET /api/cart/{email}`
    fn read_cart(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Vec<CartLineRef>, ApiError>> + Send;

    /// `POST /api/cart/{email}` with `{productId, quantity}`
    fn add_cart_item(
        &self,
        email: &Email,
        item: &CartLineRef,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `PATCH /api/cart/{email}/{productId}` with `{quantity}`
    fn update_cart_item(
        &self,
        email: &Email,
        id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE /api/cart/{email}/{productId}`
    fn remove_cart_item(
        &self,
        email: &Email,
        id: &ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE /api/cart/{email}`
    fn clear_cart(&self, email: &Email) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET /api/wishlist/{email}`
    fn read_wishlist(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Vec<WishlistEntryRef>, ApiError>> + Send;

    /// `POST /api/wishlist/{email}` with `{productId}`
    fn add_wishlist_item(
        &self,
        email: &Email,
        id: &ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE /api/wishlist/{email}/{productId}`
    fn remove_wishlist_item(
        &self,
        email: &Email,
        id: &ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET /api/orders/{email}`
    fn list_orders(&self, email: &Email)
    -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    /// `POST /api/orders`
    fn create_order(
        &self,
        draft: &OrderDraft,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;
}

// =============================================================================
// Wire Types
// =============================================================================

/// List read body: `{items: [...]}`. A missing `items` key means empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// `PATCH` body for a cart line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

/// `POST` body for a wishlist entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistAdd {
    pub product_id: ProductId,
}

/// Categories come back either as bare names or as `{name}` records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CategoryRecord {
    Name(String),
    Record { name: String },
}

impl CategoryRecord {
    pub(crate) fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Record { name } => name,
        }
    }
}

/// `POST /api/products` answers with the stored listing or just its id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreatedListing {
    Full(Product),
    Ack {
        #[serde(rename = "productId", alias = "insertedId", alias = "_id")]
        product_id: ProductId,
    },
}

impl CreatedListing {
    pub(crate) fn into_product_id(self) -> ProductId {
        match self {
            Self::Full(product) => product.product_id,
            Self::Ack { product_id } => product_id,
        }
    }
}

/// User record body. Only the profile is read; other keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProfileResponse {
    #[serde(default)]
    pub(crate) profile: Option<Profile>,
}

/// `PUT` body for a user profile.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct ProfileUpdate<'a> {
    pub(crate) profile: &'a Profile,
}

/// `POST /api/orders` answers with the stored order or just its id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreatedOrder {
    Full(Order),
    Ack {
        #[serde(rename = "orderId", alias = "insertedId", alias = "_id")]
        order_id: OrderId,
    },
}

impl CreatedOrder {
    /// Resolve the response into an order, filling an ack from the draft.
    pub(crate) fn into_order(self, draft: &OrderDraft) -> Order {
        match self {
            Self::Full(order) => order,
            Self::Ack { order_id } => Order {
                order_id,
                email: draft.email.clone(),
                items: draft.items.clone(),
                total: draft.total,
                status: just_mart_core::OrderStatus::default(),
                delivery_address: Some(draft.delivery_address.clone()),
                created_at: Some(draft.created_at),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use just_mart_core::{CartLine, Price};

    use super::*;

    #[test]
    fn test_items_response_missing_key_is_empty() {
        let body: ItemsResponse<CartLineRef> = serde_json::from_str("{}").unwrap();
        assert!(body.items.is_empty());

        let body: ItemsResponse<WishlistEntryRef> =
            serde_json::from_str(r#"{"items":[{"productId":"p2"}]}"#).unwrap();
        assert_eq!(body.items.len(), 1);
    }

    #[test]
    fn test_category_shapes() {
        let names: Vec<CategoryRecord> =
            serde_json::from_str(r#"["Books", {"name": "Electronics", "_id": "c2"}]"#).unwrap();
        let names: Vec<String> = names.into_iter().map(CategoryRecord::into_name).collect();
        assert_eq!(names, vec!["Books".to_string(), "Electronics".to_string()]);
    }

    #[test]
    fn test_created_order_ack_is_filled_from_draft() {
        let email = Email::parse("a@x.com").unwrap();
        let line = CartLine::new(Product::new(
            ProductId::parse("p1").unwrap(),
            "Desk",
            Price::from_taka(100),
        ));
        let draft = OrderDraft::from_lines(email, &[line], "Hall 2", Utc::now());

        let ack: CreatedOrder =
            serde_json::from_str(r#"{"acknowledged": true, "insertedId": "o-77"}"#).unwrap();
        let order = ack.into_order(&draft);
        assert_eq!(order.order_id.as_str(), "o-77");
        assert_eq!(order.total, Price::from_taka(100));
        assert_eq!(order.delivery_address.as_deref(), Some("Hall 2"));
    }

    #[test]
    fn test_created_listing_shapes() {
        let ack: CreatedListing =
            serde_json::from_str(r#"{"acknowledged": true, "productId": "665f"}"#).unwrap();
        assert_eq!(ack.into_product_id().as_str(), "665f");

        let ack: CreatedListing = serde_json::from_str(r#"{"insertedId": "665e"}"#).unwrap();
        assert_eq!(ack.into_product_id().as_str(), "665e");

        let full: CreatedListing =
            serde_json::from_str(r#"{"_id": "665d", "title": "Lamp", "price": 300}"#).unwrap();
        assert_eq!(full.into_product_id().as_str(), "665d");
    }

    #[test]
    fn test_profile_bodies() {
        let body: ProfileResponse =
            serde_json::from_str(r#"{"email": "a@x.com", "name": "A"}"#).unwrap();
        assert!(body.profile.is_none());

        let profile = Profile::default();
        let value = serde_json::to_value(ProfileUpdate { profile: &profile }).unwrap();
        assert_eq!(value["profile"]["address"]["locationType"], "Inside Campus");
    }

    #[test]
    fn test_rejection_classification() {
        assert!(ApiError::NotFound("p1".to_string()).is_rejection());
        assert!(
            ApiError::Status {
                status: 500,
                body: String::new()
            }
            .is_rejection()
        );
        assert!(!ApiError::InvalidUrl("x".to_string()).is_rejection());
    }
}

//! Marketplace backend client implementation.
//!
//! Plain JSON over `reqwest`. Product, product list and category reads are
//! cached using `moka`; cart, wishlist, order and profile resources never are.
//! Creating or deleting a listing drops the affected cache entries.

use std::sync::Arc;

use just_mart_core::{
    CartLineRef, Email, ListingDraft, Order, OrderDraft, Product, ProductId, Profile,
    WishlistEntryRef,
};
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::cache::{CacheKey, CacheValue};
use super::{
    ApiError, CategoryRecord, CreatedListing, CreatedOrder, Endpoints, ItemsResponse, MarketApi,
    ProfileResponse, ProfileUpdate, QuantityUpdate, WishlistAdd,
};
use crate::config::StorefrontConfig;

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How much of a response body ends up in logs and error values.
const BODY_EXCERPT_CHARS: usize = 500;

// =============================================================================
// MarketClient
// =============================================================================

/// Client for the marketplace REST backend.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct MarketClient {
    inner: Arc<MarketClientInner>,
}

struct MarketClientInner {
    http: reqwest::Client,
    endpoints: Endpoints,
    cache: Cache<CacheKey, CacheValue>,
}

impl MarketClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the base URL
    /// cannot carry paths.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(config.product_cache.max_capacity)
            .time_to_live(config.product_cache.time_to_live)
            .build();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(MarketClientInner {
                http: builder.build()?,
                endpoints: Endpoints::new(config.api_base_url.clone())?,
                cache,
            }),
        })
    }

    /// The endpoint catalog this client sends requests to.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    /// Drop every cached catalog entry.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner.http.request(method, url)
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let request_id = Uuid::new_v4().to_string();

        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await?;

        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            debug!(request_id = %request_id, url = %url, "Marketplace resource not found");
            return Err(ApiError::NotFound(url.path().to_string()));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                request_id = %request_id,
                url = %url,
                body = %excerpt(&body),
                "Marketplace API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let body = self.execute(self.request(Method::GET, url)).await?;
        parse(&body)
    }

    /// Read a `{items: [...]}` list. An empty body counts as an empty list.
    async fn get_items<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, ApiError> {
        let body = self.execute(self.request(Method::GET, url)).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse::<ItemsResponse<T>>(&body).map(|response| response.items)
    }
}

impl MarketApi for MarketClient {
    // =========================================================================
    // Catalog
    // =========================================================================

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get_json(self.inner.endpoints.product(id)).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self.get_json(self.inner.endpoints.products()).await?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let records: Vec<CategoryRecord> =
            self.get_json(self.inner.endpoints.categories()).await?;
        let categories: Vec<String> = records.into_iter().map(CategoryRecord::into_name).collect();

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Listings
    // =========================================================================

    #[instrument(skip(self, draft), fields(seller = %draft.seller_email))]
    async fn create_product(&self, draft: &ListingDraft) -> Result<ProductId, ApiError> {
        let request = self
            .request(Method::POST, self.inner.endpoints.products())
            .json(draft);
        let body = self.execute(request).await?;
        let created: CreatedListing = parse(&body)?;

        self.inner.cache.invalidate(&CacheKey::Products).await;

        Ok(created.into_product_id())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, self.inner.endpoints.product(id));
        self.execute(request).await?;

        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
        self.inner.cache.invalidate(&CacheKey::Products).await;

        Ok(())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    #[instrument(skip(self), fields(email = %email))]
    async fn get_profile(&self, email: &Email) -> Result<Option<Profile>, ApiError> {
        match self
            .get_json::<ProfileResponse>(self.inner.endpoints.user(email))
            .await
        {
            Ok(response) => Ok(response.profile),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, profile), fields(email = %email))]
    async fn update_profile(&self, email: &Email, profile: &Profile) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, self.inner.endpoints.user(email))
            .json(&ProfileUpdate { profile });
        self.execute(request).await.map(drop)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[instrument(skip(self), fields(email = %email))]
    async fn read_cart(&self, email: &Email) -> Result<Vec<CartLineRef>, ApiError> {
        self.get_items(self.inner.endpoints.cart(email)).await
    }

    #[instrument(skip(self, item), fields(email = %email, product_id = %item.product_id))]
    async fn add_cart_item(&self, email: &Email, item: &CartLineRef) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, self.inner.endpoints.cart(email))
            .json(item);
        self.execute(request).await.map(drop)
    }

    #[instrument(skip(self), fields(email = %email, product_id = %id))]
    async fn update_cart_item(
        &self,
        email: &Email,
        id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PATCH, self.inner.endpoints.cart_item(email, id))
            .json(&QuantityUpdate { quantity });
        self.execute(request).await.map(drop)
    }

    #[instrument(skip(self), fields(email = %email, product_id = %id))]
    async fn remove_cart_item(&self, email: &Email, id: &ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, self.inner.endpoints.cart_item(email, id));
        self.execute(request).await.map(drop)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn clear_cart(&self, email: &Email) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, self.inner.endpoints.cart(email));
        self.execute(request).await.map(drop)
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    #[instrument(skip(self), fields(email = %email))]
    async fn read_wishlist(&self, email: &Email) -> Result<Vec<WishlistEntryRef>, ApiError> {
        self.get_items(self.inner.endpoints.wishlist(email)).await
    }

    #[instrument(skip(self), fields(email = %email, product_id = %id))]
    async fn add_wishlist_item(&self, email: &Email, id: &ProductId) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, self.inner.endpoints.wishlist(email))
            .json(&WishlistAdd {
                product_id: id.clone(),
            });
        self.execute(request).await.map(drop)
    }

    #[instrument(skip(self), fields(email = %email, product_id = %id))]
    async fn remove_wishlist_item(&self, email: &Email, id: &ProductId) -> Result<(), ApiError> {
        let request = self.request(
            Method::DELETE,
            self.inner.endpoints.wishlist_item(email, id),
        );
        self.execute(request).await.map(drop)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    #[instrument(skip(self), fields(email = %email))]
    async fn list_orders(&self, email: &Email) -> Result<Vec<Order>, ApiError> {
        self.get_json(self.inner.endpoints.orders(email)).await
    }

    #[instrument(skip(self, draft), fields(email = %draft.email, items = draft.items.len()))]
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        let request = self
            .request(Method::POST, self.inner.endpoints.create_order())
            .json(draft);
        let body = self.execute(request).await?;
        let created: CreatedOrder = parse(&body)?;
        Ok(created.into_order(draft))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %excerpt(body),
            "Failed to parse marketplace response"
        );
        ApiError::Parse(e)
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

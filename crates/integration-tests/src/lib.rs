//! Integration tests for the JustMart storefront.
//!
//! [`TestBackend`] is an in-process `axum` stand-in for the marketplace
//! backend, bound to an ephemeral port. It keeps listings, profiles, carts,
//! wishlists and orders in memory, shapes its responses like the real backend (`_id` keys,
//! `{items: [...]}` list bodies, insert acknowledgements), records every
//! request, and can be told to fail or slow down specific routes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p just-mart-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use just_mart_storefront::api::REQUEST_ID_HEADER;
use just_mart_storefront::config::parse_base_url;
use just_mart_storefront::{IdentityContext, MarketClient, Storefront, StorefrontConfig};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Raw, still percent-encoded path.
    pub path: String,
    pub request_id: Option<String>,
}

type Route = (String, String);

#[derive(Default)]
struct Data {
    products: Vec<Value>,
    categories: Vec<Value>,
    carts: HashMap<String, Vec<(String, u64)>>,
    wishlists: HashMap<String, Vec<String>>,
    orders: Vec<Value>,
    profiles: HashMap<String, Value>,
    requests: Vec<RecordedRequest>,
    failures: HashSet<Route>,
    delays: HashMap<Route, Duration>,
}

type Shared = Arc<Mutex<Data>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Data> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn route(method: &str, path: &str) -> Route {
    (method.to_uppercase(), path.to_string())
}

/// In-process marketplace backend.
pub struct TestBackend {
    addr: SocketAddr,
    data: Shared,
    server: JoinHandle<()>,
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl TestBackend {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let data = Shared::default();
        let app = router(Arc::clone(&data));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test backend");
        let addr = listener.local_addr().expect("Failed to read local address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test backend stopped");
        });

        Self { addr, data, server }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::new(parse_base_url(&self.url()).expect("Invalid backend URL"))
    }

    #[must_use]
    pub fn client(&self) -> MarketClient {
        MarketClient::new(&self.config()).expect("Failed to build client")
    }

    /// A signed-out storefront talking to this backend.
    #[must_use]
    pub fn storefront(&self) -> Storefront<MarketClient> {
        Storefront::new(Arc::new(self.client()), IdentityContext::new())
    }

    /// Add a listing, stored the way the backend's database returns it.
    pub fn add_product(&self, id: &str, title: &str, price: u64, category: &str) {
        lock(&self.data).products.push(json!({
            "_id": id,
            "title": title,
            "price": price,
            "image": format!("https://img.example/{id}.jpg"),
            "category": category,
            "condition": "Used - Good",
            "sellerEmail": "seller@just.edu.bd",
            "stock": 5,
        }));
    }

    /// Every stored listing, including ones created through the API.
    #[must_use]
    pub fn products(&self) -> Vec<Value> {
        lock(&self.data).products.clone()
    }

    #[must_use]
    pub fn profile(&self, email: &str) -> Option<Value> {
        lock(&self.data).profiles.get(email).cloned()
    }

    pub fn add_category(&self, name: &str) {
        let mut data = lock(&self.data);
        let id = format!("c{}", data.categories.len() + 1);
        data.categories.push(json!({ "_id": id, "name": name }));
    }

    pub fn set_cart(&self, email: &str, lines: &[(&str, u64)]) {
        lock(&self.data).carts.insert(
            email.to_string(),
            lines.iter().map(|(id, q)| ((*id).to_string(), *q)).collect(),
        );
    }

    #[must_use]
    pub fn cart(&self, email: &str) -> Vec<(String, u64)> {
        lock(&self.data).carts.get(email).cloned().unwrap_or_default()
    }

    pub fn set_wishlist(&self, email: &str, ids: &[&str]) {
        lock(&self.data).wishlists.insert(
            email.to_string(),
            ids.iter().map(|id| (*id).to_string()).collect(),
        );
    }

    #[must_use]
    pub fn wishlist(&self, email: &str) -> Vec<String> {
        lock(&self.data)
            .wishlists
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        lock(&self.data).orders.clone()
    }

    /// Answer `method path` with a 500 until [`recover`](Self::recover).
    pub fn fail(&self, method: &str, path: &str) {
        lock(&self.data).failures.insert(route(method, path));
    }

    pub fn recover(&self, method: &str, path: &str) {
        lock(&self.data).failures.remove(&route(method, path));
    }

    /// Hold every `method path` request for `delay` before answering.
    pub fn delay(&self, method: &str, path: &str, delay: Duration) {
        lock(&self.data).delays.insert(route(method, path), delay);
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.data).requests.clone()
    }

    /// Number of requests seen for `method path`.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        let (method, path) = route(method, path);
        lock(&self.data)
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

/// Poll `condition` every few milliseconds for up to two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Condition not met within two seconds");
}

fn router(data: Shared) -> Router {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/{id}", get(get_product).delete(delete_product))
        .route("/api/users/{email}", get(get_user).put(update_user))
        .route("/api/categories", get(list_categories))
        .route(
            "/api/cart/{email}",
            get(read_cart).post(add_cart_item).delete(clear_cart),
        )
        .route(
            "/api/cart/{email}/{id}",
            delete(remove_cart_item).patch(update_cart_item),
        )
        .route("/api/wishlist/{email}", get(read_wishlist).post(add_wishlist_item))
        .route("/api/wishlist/{email}/{id}", delete(remove_wishlist_item))
        .route("/api/orders", post(create_order))
        .route("/api/orders/{email}", get(list_orders))
        .layer(middleware::from_fn_with_state(Arc::clone(&data), intercept))
        .with_state(data)
}

/// Record the request, then apply any injected delay or failure.
async fn intercept(State(data): State<Shared>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let key = (method.clone(), path.clone());
    let (fail, delay) = {
        let mut data = lock(&data);
        data.requests.push(RecordedRequest {
            method,
            path,
            request_id,
        });
        (data.failures.contains(&key), data.delays.get(&key).copied())
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if fail {
        return (StatusCode::INTERNAL_SERVER_ERROR, "injected failure").into_response();
    }
    next.run(request).await
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}

fn ack() -> Json<Value> {
    Json(json!({ "acknowledged": true }))
}

async fn list_products(State(data): State<Shared>) -> Json<Vec<Value>> {
    Json(lock(&data).products.clone())
}

async fn get_product(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    let product = lock(&data)
        .products
        .iter()
        .find(|p| p["_id"] == id.as_str())
        .cloned();
    product.map_or_else(not_found, |p| Json(p).into_response())
}

async fn create_product(State(data): State<Shared>, Json(mut body): Json<Value>) -> Response {
    if body["title"].as_str().is_none() || body["sellerEmail"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, "title and sellerEmail required").into_response();
    }
    let mut data = lock(&data);
    let id = format!("prod-{}", data.products.len() + 1);
    body["_id"] = json!(id);
    data.products.push(body);
    (
        StatusCode::CREATED,
        Json(json!({ "acknowledged": true, "productId": id })),
    )
        .into_response()
}

async fn delete_product(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    let mut data = lock(&data);
    let before = data.products.len();
    data.products.retain(|p| p["_id"] != id.as_str());
    if data.products.len() == before {
        return not_found();
    }
    ack().into_response()
}

async fn get_user(State(data): State<Shared>, Path(email): Path<String>) -> Response {
    match lock(&data).profiles.get(&email) {
        Some(profile) => Json(json!({ "email": email, "profile": profile })).into_response(),
        None => not_found(),
    }
}

async fn update_user(
    State(data): State<Shared>,
    Path(email): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Some(profile) = body.get("profile").filter(|p| p.is_object()) else {
        return (StatusCode::BAD_REQUEST, "profile required").into_response();
    };
    lock(&data).profiles.insert(email, profile.clone());
    ack().into_response()
}

async fn list_categories(State(data): State<Shared>) -> Json<Vec<Value>> {
    Json(lock(&data).categories.clone())
}

async fn read_cart(State(data): State<Shared>, Path(email): Path<String>) -> Json<Value> {
    // An unknown user gets a body without `items`
    match lock(&data).carts.get(&email) {
        Some(lines) => Json(json!({
            "items": lines
                .iter()
                .map(|(id, q)| json!({ "productId": id, "quantity": q }))
                .collect::<Vec<_>>()
        })),
        None => Json(json!({})),
    }
}

async fn add_cart_item(
    State(data): State<Shared>,
    Path(email): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let (Some(id), Some(quantity)) = (body["productId"].as_str(), body["quantity"].as_u64()) else {
        return (StatusCode::BAD_REQUEST, "productId and quantity required").into_response();
    };
    let mut data = lock(&data);
    let lines = data.carts.entry(email).or_default();
    match lines.iter_mut().find(|(line, _)| line == id) {
        Some((_, q)) => *q += quantity,
        None => lines.push((id.to_string(), quantity)),
    }
    (StatusCode::CREATED, ack()).into_response()
}

async fn update_cart_item(
    State(data): State<Shared>,
    Path((email, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let Some(quantity) = body["quantity"].as_u64() else {
        return (StatusCode::BAD_REQUEST, "quantity required").into_response();
    };
    let mut data = lock(&data);
    let line = data
        .carts
        .get_mut(&email)
        .and_then(|lines| lines.iter_mut().find(|(line, _)| *line == id));
    match line {
        Some((_, q)) => {
            *q = quantity;
            ack().into_response()
        }
        None => not_found(),
    }
}

async fn remove_cart_item(
    State(data): State<Shared>,
    Path((email, id)): Path<(String, String)>,
) -> Json<Value> {
    if let Some(lines) = lock(&data).carts.get_mut(&email) {
        lines.retain(|(line, _)| *line != id);
    }
    ack()
}

async fn clear_cart(State(data): State<Shared>, Path(email): Path<String>) -> Json<Value> {
    lock(&data).carts.remove(&email);
    ack()
}

async fn read_wishlist(State(data): State<Shared>, Path(email): Path<String>) -> Json<Value> {
    let ids = lock(&data).wishlists.get(&email).cloned().unwrap_or_default();
    Json(json!({
        "items": ids.iter().map(|id| json!({ "productId": id })).collect::<Vec<_>>()
    }))
}

async fn add_wishlist_item(
    State(data): State<Shared>,
    Path(email): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Some(id) = body["productId"].as_str() else {
        return (StatusCode::BAD_REQUEST, "productId required").into_response();
    };
    let mut data = lock(&data);
    let ids = data.wishlists.entry(email).or_default();
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
    (StatusCode::CREATED, ack()).into_response()
}

async fn remove_wishlist_item(
    State(data): State<Shared>,
    Path((email, id)): Path<(String, String)>,
) -> Json<Value> {
    if let Some(ids) = lock(&data).wishlists.get_mut(&email) {
        ids.retain(|existing| *existing != id);
    }
    ack()
}

async fn list_orders(State(data): State<Shared>, Path(email): Path<String>) -> Json<Vec<Value>> {
    Json(
        lock(&data)
            .orders
            .iter()
            .filter(|order| order["email"] == email.as_str())
            .cloned()
            .collect(),
    )
}

async fn create_order(State(data): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut data = lock(&data);
    let id = format!("ord-{}", data.orders.len() + 1);
    body["_id"] = json!(id);
    data.orders.push(body);
    (
        StatusCode::CREATED,
        Json(json!({ "acknowledged": true, "insertedId": id })),
    )
        .into_response()
}

//! Integration tests for Shopfront.
//!
//! Tests drive the real client (`ApiClient`, `SessionStore`, `CartStore`,
//! checkout, catalog, orders, reports) against [`MockBackend`], an axum
//! server bound to an ephemeral local port that mimics the backend contract
//! under an `/api` prefix.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Fixtures
//!
//! | Account              | Password | Token       | Role     |
//! |----------------------|----------|-------------|----------|
//! | `asha@example.com`   | `secret` | `tok-asha`  | customer |
//! | `admin@example.com`  | `secret` | `tok-admin` | admin    |
//! | `notoken@example.com`| any      | (none)      | -        |
//!
//! Any other login answers `401 {"message": "Invalid credentials"}`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use shopfront_client::{ApiClient, ApiError, ClientConfig};
use url::Url;

/// Customer account fixture.
pub const CUSTOMER_EMAIL: &str = "asha@example.com";
/// Admin account fixture.
pub const ADMIN_EMAIL: &str = "admin@example.com";
/// Account whose login response omits the token.
pub const NO_TOKEN_EMAIL: &str = "notoken@example.com";
/// Password of every fixture account.
pub const PASSWORD: &str = "secret";
/// Email the register endpoint reports as taken.
pub const TAKEN_EMAIL: &str = "taken@example.com";

/// Backend user ID of the customer fixture.
pub const CUSTOMER_ID: i64 = 7;

/// A request as the mock backend received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    products: Mutex<Vec<Value>>,
    order_lines: Mutex<Vec<(i64, Value)>>,
    next_order_id: AtomicI64,
    next_product_id: AtomicI64,
}

impl MockState {
    fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process stand-in for the storefront backend.
#[derive(Debug)]
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Bind to an ephemeral port and serve in a background task.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockState {
            next_order_id: AtomicI64::new(1),
            next_product_id: AtomicI64::new(100),
            ..MockState::default()
        });
        *MockState::lock(&state.products) = seed_products();

        let api = Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/products", get(list_products).post(create_product))
            .route("/products/dashboard", get(dashboard))
            .route("/products/{id}", put(update_product).delete(delete_product))
            .route("/orders", post(create_order))
            .route("/orders/{user_id}", get(list_orders))
            .route("/broken", get(broken))
            .route("/teapot", get(teapot))
            .route("/empty", get(empty));

        let app = Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state })
    }

    /// Base URL including the `/api` prefix.
    ///
    /// # Panics
    ///
    /// Never: the address is always a valid URL.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).unwrap()
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::new`].
    pub fn config(
        &self,
        data_dir: impl Into<std::path::PathBuf>,
    ) -> Result<ClientConfig, shopfront_client::ConfigError> {
        ClientConfig::new(self.base_url().as_str(), data_dir)
    }

    /// HTTP client pointing at this backend.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::with_base_url`].
    pub fn api(&self) -> Result<ApiClient, ApiError> {
        ApiClient::with_base_url(&self.base_url())
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        MockState::lock(&self.state.requests).clone()
    }

    /// Requests received for one path (without the `/api` prefix).
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        let full = format!("/api{path}");
        self.requests()
            .into_iter()
            .filter(|r| r.path == full)
            .collect()
    }

    /// Current catalog.
    #[must_use]
    pub fn products(&self) -> Vec<Value> {
        MockState::lock(&self.state.products).clone()
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn seed_products() -> Vec<Value> {
    vec![
        json!({
            "_id": "p1", "sku": "MUG-01", "name": "Coffee Mug", "price": 12.5,
            "category": "Kitchen", "updatedAt": "2024-05-01T00:00:00Z"
        }),
        json!({
            "id": 2, "sku": "KB-01", "name": "Mechanical Keyboard", "price": "89.99",
            "category": "Electronics"
        }),
        json!({
            "_id": "p3", "sku": "MS-01", "name": "Mouse", "price": 25,
            "category": "Electronics"
        }),
    ]
}

fn user_for_token(headers: &HeaderMap) -> Option<(i64, bool)> {
    let token = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    match token {
        "tok-asha" => Some((CUSTOMER_ID, false)),
        "tok-admin" => Some((1, true)),
        _ => None,
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn price_of(product: &Value) -> f64 {
    match product.get("price") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        _ => 0.0,
    }
}

fn product_matches(product: &Value, id: &str) -> bool {
    let as_text = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    product.get("_id").map(as_text).as_deref() == Some(id)
        || product.get("id").map(as_text).as_deref() == Some(id)
}

// =============================================================================
// Handlers
// =============================================================================

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    MockState::lock(&state.requests).push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header(AUTHORIZATION),
        content_type: header(CONTENT_TYPE),
        body: serde_json::from_slice(&bytes).ok(),
    });

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

async fn register(Json(body): Json<Value>) -> Response {
    if body.get("email").and_then(Value::as_str) == Some(TAKEN_EMAIL) {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "User already exists" })),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User registered" })),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match (email, password) {
        (CUSTOMER_EMAIL, PASSWORD) => Json(json!({
            "token": "tok-asha",
            "user": { "id": CUSTOMER_ID, "name": "Asha", "email": CUSTOMER_EMAIL, "role": "customer" }
        }))
        .into_response(),
        (ADMIN_EMAIL, PASSWORD) => Json(json!({
            "token": "tok-admin",
            "user": { "id": "1", "email": ADMIN_EMAIL, "role": "admin" }
        }))
        .into_response(),
        (NO_TOKEN_EMAIL, _) => Json(json!({
            "user": { "id": 9, "name": "Nobody", "email": NO_TOKEN_EMAIL }
        }))
        .into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn list_products(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut products = MockState::lock(&state.products).clone();
    match params.get("sort").map(String::as_str) {
        Some("asc") => products.sort_by(|a, b| price_of(a).total_cmp(&price_of(b))),
        Some("desc") => products.sort_by(|a, b| price_of(b).total_cmp(&price_of(a))),
        _ => {}
    }
    Json(Value::Array(products))
}

async fn create_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !matches!(user_for_token(&headers), Some((_, true))) {
        return error(StatusCode::FORBIDDEN, "Admin access required");
    }
    let id = state.next_product_id.fetch_add(1, Ordering::SeqCst);
    body["_id"] = json!(format!("p{id}"));
    body["updatedAt"] = json!("2024-06-01T00:00:00Z");
    MockState::lock(&state.products).push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_product(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !matches!(user_for_token(&headers), Some((_, true))) {
        return error(StatusCode::FORBIDDEN, "Admin access required");
    }
    let mut products = MockState::lock(&state.products);
    let Some(product) = products.iter_mut().find(|p| product_matches(p, &id)) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    if let (Value::Object(target), Value::Object(fields)) = (product, body) {
        target.extend(fields);
        target.insert("updatedAt".to_string(), json!("2024-06-02T00:00:00Z"));
        return Json(Value::Object(target.clone())).into_response();
    }
    error(StatusCode::BAD_REQUEST, "Invalid product")
}

async fn delete_product(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !matches!(user_for_token(&headers), Some((_, true))) {
        return error(StatusCode::FORBIDDEN, "Admin access required");
    }
    let mut products = MockState::lock(&state.products);
    let before = products.len();
    products.retain(|p| !product_matches(p, &id));
    if products.len() == before {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn dashboard(headers: HeaderMap) -> Response {
    if !matches!(user_for_token(&headers), Some((_, true))) {
        return error(StatusCode::FORBIDDEN, "Admin access required");
    }
    Json(json!({
        "dailyRevenue": [
            { "date": "2024-06-01", "revenue": "₹1,250.50" },
            { "date": "2024-06-02", "revenueAmount": 300 }
        ],
        "topCustomers": [
            { "userName": "Asha", "totalSpent": "900", "totalOrders": 3 },
            { "nickname": "mystery" }
        ],
        "categorySales": [
            { "category": "Kitchen", "total": "120", "itemCount": 4 }
        ]
    }))
    .into_response()
}

async fn create_order(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some((user_id, _)) = user_for_token(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    };
    let Some(items) = body.get("items").and_then(Value::as_array) else {
        return error(StatusCode::BAD_REQUEST, "Items are required");
    };
    if items.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Items are required");
    }

    let order_id = state.next_order_id.fetch_add(1, Ordering::SeqCst);
    let created_at = format!("2024-06-{order_id:02}T10:00:00Z");
    let total = body.get("total").cloned().unwrap_or(Value::Null);

    let mut lines = MockState::lock(&state.order_lines);
    for item in items {
        lines.push((
            user_id,
            json!({
                "orderId": order_id,
                "total": total,
                "createdAt": created_at,
                "productId": item.get("productId"),
                "quantity": item.get("quantity"),
                "priceAtPurchase": item.get("priceAtPurchase"),
            }),
        ));
    }

    (
        StatusCode::CREATED,
        Json(json!({ "orderId": order_id, "userId": user_id, "total": total })),
    )
        .into_response()
}

async fn list_orders(
    State(state): State<Arc<MockState>>,
    Path(user_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if user_for_token(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let date = params.get("date");
    let lines: Vec<Value> = MockState::lock(&state.order_lines)
        .iter()
        .filter(|(owner, _)| *owner == user_id)
        .map(|(_, line)| line)
        .filter(|line| {
            date.is_none_or(|d| {
                line.get("createdAt")
                    .and_then(Value::as_str)
                    .is_some_and(|at| at.starts_with(d.as_str()))
            })
        })
        .cloned()
        .collect();
    Json(Value::Array(lines)).into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}

async fn teapot() -> Response {
    (StatusCode::IM_A_TEAPOT, Json(json!({ "message": "" }))).into_response()
}

async fn empty() -> Response {
    (StatusCode::OK, Bytes::new()).into_response()
}

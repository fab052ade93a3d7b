//! Integration test support for the Neotech storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p neotech-integration-tests
//! ```
//!
//! No external services are needed: [`MockNeotech`] serves the subset of the
//! Neotech REST API the storefront uses on an ephemeral local port, and
//! [`TestStorefront`] runs the real storefront router against it.
//!
//! # Test Categories
//!
//! - `session_bootstrap` - fetch-or-create-guest against the mock API
//! - `cart_mutations` - cart controller over the real HTTP order client
//! - `storefront_routes` - HTML routes and HTMX fragments end to end

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use neotech_storefront::api::ApiClient;
use neotech_storefront::config::{ApiConfig, StorefrontConfig};
use neotech_storefront::shopper::ShopperRegistry;
use neotech_storefront::state::AppState;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// First id handed out to guests.
const FIRST_GUEST_ID: i64 = 100;

// =============================================================================
// Mock Neotech API
// =============================================================================

/// Scriptable state behind the mock API.
pub struct MockState {
    next_user_id: AtomicI64,
    users: Mutex<HashMap<i64, Value>>,
    products: Vec<Value>,
    order: Mutex<BTreeMap<(i64, i64), u32>>,
    rejected_products: Mutex<HashSet<i64>>,
    user_status: Mutex<Option<u16>>,
    guest_status: Mutex<u16>,
    requests: Mutex<Vec<String>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            next_user_id: AtomicI64::new(FIRST_GUEST_ID),
            users: Mutex::new(HashMap::new()),
            products: default_products(),
            order: Mutex::new(BTreeMap::new()),
            rejected_products: Mutex::new(HashSet::new()),
            user_status: Mutex::new(None),
            guest_status: Mutex::new(201),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl MockState {
    /// Register an existing user.
    pub fn seed_user(&self, id: i64, name: &str) {
        self.users
            .lock()
            .unwrap()
            .insert(id, json!({ "id": id, "name": name, "guest": false }));
    }

    /// Answer `GET users/{id}` with this status (body unchanged).
    pub fn set_user_status(&self, status: u16) {
        *self.user_status.lock().unwrap() = Some(status);
    }

    /// Answer `POST users/create_guest_user` with this status.
    pub fn set_guest_status(&self, status: u16) {
        *self.guest_status.lock().unwrap() = status;
    }

    /// Reject every order mutation for `product_id` with 422.
    pub fn reject_orders_for(&self, product_id: i64) {
        self.rejected_products.lock().unwrap().insert(product_id);
    }

    /// Server-side quantity of a product in a user's order.
    pub fn order_quantity(&self, user_id: i64, product_id: i64) -> u32 {
        self.order
            .lock()
            .unwrap()
            .get(&(user_id, product_id))
            .copied()
            .unwrap_or(0)
    }

    /// Every request seen, as `"METHOD path"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose log line starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    fn log(&self, line: String) {
        self.requests.lock().unwrap().push(line);
    }

    fn rejects(&self, product_id: i64) -> bool {
        self.rejected_products.lock().unwrap().contains(&product_id)
    }
}

fn default_products() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "name": "Mechanical Keyboard",
            "description": "Hot-swappable, 75% layout",
            "price": 89.99,
            "image": "https://images.example.com/keyboard.png"
        }),
        json!({
            "id": 2,
            "name": "Wireless Mouse",
            "description": "Ergonomic, 4000 DPI",
            "price": 39.5,
            "image": "https://images.example.com/mouse.png"
        }),
        json!({
            "id": 3,
            "name": "USB-C Hub",
            "description": "7 ports, 100W pass-through",
            "price": 24.0,
            "image": "https://images.example.com/hub.png"
        }),
    ]
}

/// A running mock of the Neotech API.
pub struct MockNeotech {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockNeotech {
    /// Serve the mock on an ephemeral port.
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = mock_router(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// API root the storefront should use.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("{}/api/v1/", self.base_url)
    }

    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::with_base_url(&self.api_url()).unwrap()
    }

    /// A real API client pointed at the mock.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).unwrap()
    }
}

fn mock_router(state: Arc<MockState>) -> Router {
    let api = Router::new()
        .route("/users/create_guest_user", post(create_guest_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/order_items", post(add_order_item))
        .route(
            "/users/{id}/order_items/{product_id}",
            delete(remove_order_item),
        )
        .route("/products", get(list_products));

    Router::new().nest("/api/v1", api).with_state(state)
}

async fn get_user(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    state.log(format!("GET users/{id}"));
    let user = state.users.lock().unwrap().get(&id).cloned();
    let Some(user) = user else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response();
    };

    let status = state
        .user_status
        .lock()
        .unwrap()
        .map_or(StatusCode::OK, |code| StatusCode::from_u16(code).unwrap());
    (status, Json(user)).into_response()
}

async fn create_guest_user(State(state): State<Arc<MockState>>) -> Response {
    state.log("POST users/create_guest_user".to_string());
    let status = StatusCode::from_u16(*state.guest_status.lock().unwrap()).unwrap();
    if !status.is_success() {
        return (status, Json(json!({ "error": "unavailable" }))).into_response();
    }

    let id = state.next_user_id.fetch_add(1, Ordering::SeqCst);
    let user = json!({
        "id": id,
        "name": format!("guest-{id}"),
        "guest": true,
        "created_at": "2024-05-01T12:00:00Z"
    });
    state.users.lock().unwrap().insert(id, user.clone());
    (status, Json(user)).into_response()
}

async fn list_products(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.log("GET products".to_string());
    Json(Value::Array(state.products.clone()))
}

#[derive(Deserialize)]
struct OrderItemBody {
    product_id: i64,
}

async fn add_order_item(
    State(state): State<Arc<MockState>>,
    Path(user_id): Path<i64>,
    Json(body): Json<OrderItemBody>,
) -> StatusCode {
    state.log(format!("POST users/{user_id}/order_items {}", body.product_id));
    if state.rejects(body.product_id) {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    *state
        .order
        .lock()
        .unwrap()
        .entry((user_id, body.product_id))
        .or_default() += 1;
    StatusCode::CREATED
}

#[derive(Deserialize)]
struct RemoveQuery {
    #[serde(default)]
    all: bool,
}

async fn remove_order_item(
    State(state): State<Arc<MockState>>,
    Path((user_id, product_id)): Path<(i64, i64)>,
    Query(query): Query<RemoveQuery>,
) -> StatusCode {
    let suffix = if query.all { "?all=true" } else { "" };
    state.log(format!("DELETE users/{user_id}/order_items/{product_id}{suffix}"));
    if state.rejects(product_id) {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }

    let mut order = state.order.lock().unwrap();
    let key = (user_id, product_id);
    match order.get_mut(&key) {
        Some(quantity) if !query.all && *quantity > 1 => *quantity -= 1,
        Some(_) => {
            order.remove(&key);
        }
        None => {}
    }
    StatusCode::NO_CONTENT
}

// =============================================================================
// Storefront under test
// =============================================================================

/// The storefront router served on an ephemeral port, with a cookie-keeping
/// client (one client = one browser session).
pub struct TestStorefront {
    pub url: String,
    pub client: reqwest::Client,
    pub state: AppState,
}

impl TestStorefront {
    /// Serve the storefront against `mock` with in-memory shopper storage.
    pub async fn spawn(mock: &MockNeotech) -> Self {
        let api_config = mock.api_config();
        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            state_dir: std::env::temp_dir(),
            api: api_config,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let api = ApiClient::new(&config.api).unwrap();
        let shoppers = ShopperRegistry::in_memory(api.clone());
        let state = AppState::from_parts(config, api, shoppers);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = neotech_storefront::app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{addr}"),
            client: browser(),
            state,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.url))
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.url))
            .send()
            .await
            .unwrap()
    }

    /// Load pages until this browser's session has a user.
    pub async fn wait_for_session(&self) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let body = self.get("/profile").await.text().await.unwrap();
            if body.contains("YOUR ORDERS:") {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "session never finished bootstrapping"
            );
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

/// A fresh cookie-keeping HTTP client.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

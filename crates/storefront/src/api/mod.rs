//! Neotech REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The API is the source of truth for users and orders - no local sync
//! - The product catalog is cached in memory via `moka` (5 minute TTL)
//!
//! # Endpoints
//!
//! ```text
//! GET    users/{id}                                  - Fetch a user
//! POST   users/create_guest_user                     - Create a guest user (no body)
//! GET    products                                    - Product catalog
//! POST   users/{id}/order_items                      - Increment a product in the open order
//! DELETE users/{id}/order_items/{product_id}         - Decrement a product
//! DELETE users/{id}/order_items/{product_id}?all=true - Drop the product's line
//! ```

mod cache;
mod orders;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use neotech_core::{Product, ProductId, User, UserId};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;
use crate::session::UserService;

use cache::{CacheKey, CacheValue};

/// How long the product catalog stays cached.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Longest response body excerpt kept in errors and logs.
const BODY_EXCERPT_CHARS: usize = 200;

/// Errors that can occur when talking to the Neotech API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a status the operation does not accept.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The payload did not have the expected shape.
    #[error("Unexpected payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Client construction failed (bad header value).
    #[error("Client setup error: {0}")]
    Setup(String),
}

impl ApiError {
    /// Whether the failure happened before a response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Which statuses count as success for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Exactly `200 OK`.
    Ok,
    /// Any 2xx.
    Success,
}

impl Expect {
    fn accepts(self, status: StatusCode) -> bool {
        match self {
            Self::Ok => status == StatusCode::OK,
            Self::Success => status.is_success(),
        }
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Neotech REST API.
///
/// Cheaply cloneable; clones share the connection pool and catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        if let Some(bearer) = config.bearer() {
            let mut value = HeaderValue::from_str(&bearer)
                .map_err(|e| ApiError::Setup(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CATALOG_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Check the status, then parse the body as `T`.
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        expect: Expect,
    ) -> Result<T, ApiError> {
        let status = response.status();

        // Body as text first for better error diagnostics
        let body = response.text().await?;

        if !expect.accepts(status) {
            tracing::warn!(
                status = %status,
                body = %excerpt(&body),
                "Neotech API returned unexpected status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse Neotech API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Check the status and discard the body.
    async fn read_empty(response: reqwest::Response, expect: Expect) -> Result<(), ApiError> {
        let status = response.status();
        if expect.accepts(status) {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            status = %status,
            body = %excerpt(&body),
            "Neotech API rejected order mutation"
        );
        Err(ApiError::Status {
            status: status.as_u16(),
            message: excerpt(&body),
        })
    }

    // =========================================================================
    // User Methods
    // =========================================================================

    /// Fetch an existing user. Only `200 OK` counts as success.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, any other status, or a
    /// payload without an integer `id`.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: UserId) -> Result<User, ApiError> {
        let url = self.url(&format!("users/{user_id}"))?;
        let response = self.http().get(url).send().await?;
        Self::read_json(response, Expect::Ok).await
    }

    /// Create a guest user. The request has no body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a
    /// malformed payload.
    #[instrument(skip(self))]
    pub async fn create_guest(&self) -> Result<User, ApiError> {
        let url = self.url("users/create_guest_user")?;
        let response = self.http().post(url).send().await?;
        let user: User = Self::read_json(response, Expect::Success).await?;
        debug!(user_id = %user.id, "Guest user created");
        Ok(user)
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List the product catalog (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<[Product]>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let url = self.url("products")?;
        let response = self.http().get(url).send().await?;
        let products: Vec<Product> = Self::read_json(response, Expect::Success).await?;
        let products: Arc<[Product]> = products.into();

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Look up one product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>, ApiError> {
        let products = self.list_products().await?;
        Ok(products.iter().find(|p| p.id == product_id).cloned())
    }
}

impl UserService for ApiClient {
    async fn fetch_user(&self, user_id: UserId) -> Result<User, ApiError> {
        self.get_user(user_id).await
    }

    async fn create_guest_user(&self) -> Result<User, ApiError> {
        self.create_guest().await
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_ok_is_exact() {
        assert!(Expect::Ok.accepts(StatusCode::OK));
        assert!(!Expect::Ok.accepts(StatusCode::CREATED));
        assert!(!Expect::Ok.accepts(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_expect_success_accepts_2xx() {
        assert!(Expect::Success.accepts(StatusCode::OK));
        assert!(Expect::Success.accepts(StatusCode::CREATED));
        assert!(!Expect::Success.accepts(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 404 - not found");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(BODY_EXCERPT_CHARS * 2);
        assert_eq!(excerpt(&long).len(), BODY_EXCERPT_CHARS);
    }

    #[test]
    fn test_url_joins_under_api_root() {
        let config = ApiConfig::with_base_url("http://127.0.0.1:9/api/v1").unwrap();
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(
            client.url("users/create_guest_user").unwrap().as_str(),
            "http://127.0.0.1:9/api/v1/users/create_guest_user"
        );
    }
}

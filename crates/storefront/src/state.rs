//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::shopper::ShopperRegistry;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// API client, the shopper registry and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    shoppers: ShopperRegistry<ApiClient>,
}

impl AppState {
    /// Create a new application state with file-backed shopper storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let shoppers = ShopperRegistry::new(api.clone(), config.state_dir.clone());
        Ok(Self::from_parts(config, api, shoppers))
    }

    /// Create a state from prebuilt parts.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        api: ApiClient,
        shoppers: ShopperRegistry<ApiClient>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                shoppers,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Neotech API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the shopper registry.
    #[must_use]
    pub fn shoppers(&self) -> &ShopperRegistry<ApiClient> {
        &self.inner.shoppers
    }
}

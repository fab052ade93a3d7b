//! CLI command implementations.
//!
//! Every command works against one [`Context`]: an API client, file-backed
//! local storage and a fresh store for this run.

pub mod cart;
pub mod products;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use neotech_storefront::api::ApiClient;
use neotech_storefront::config::ApiConfig;
use neotech_storefront::notifications::Notification;
use neotech_storefront::session::SessionStore;
use neotech_storefront::storage::FileStorage;
use neotech_storefront::store::Store;

/// Fallback when neither `--state-dir` nor `STOREFRONT_STATE_DIR` is set.
const DEFAULT_STATE_DIR: &str = ".neotech";

/// Shared state for one CLI run.
pub struct Context {
    pub api: ApiClient,
    pub store: Store,
    pub session: SessionStore<ApiClient>,
    pub state_dir: PathBuf,
}

impl Context {
    /// Build the context from flags and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API configuration is invalid.
    pub fn new(
        state_dir: Option<PathBuf>,
        api_url: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match api_url {
            Some(url) => ApiConfig::with_base_url(url)?,
            None => ApiConfig::from_env()?,
        };
        let api = ApiClient::new(&config)?;

        let state_dir = state_dir
            .or_else(|| std::env::var_os("STOREFRONT_STATE_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
        tracing::debug!(state_dir = %state_dir.display(), api = %config.base_url, "CLI context");

        let store = Store::new();
        let storage = Arc::new(FileStorage::new(&state_dir));
        let session = SessionStore::new(store.clone(), api.clone(), storage);

        Ok(Self {
            api,
            store,
            session,
            state_dir,
        })
    }

    /// Print and clear queued toasts.
    pub fn flush_notifications(&self) {
        for toast in self.store.take_notifications() {
            print_notification(&toast);
        }
    }
}

fn print_notification(toast: &Notification) {
    eprintln!(
        "[{}] {}: {}",
        toast.level.as_str(),
        toast.title,
        toast.message
    );
}

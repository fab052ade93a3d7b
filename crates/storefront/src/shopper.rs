//! Per-browser-session shopper state.
//!
//! A [`Shopper`] bundles one store, its session store and the root
//! cancellation scope for its cart lines. The [`ShopperRegistry`] keeps
//! shoppers in a `moka` cache with idle expiry; when a shopper is evicted
//! its scope closes, which abandons any cart request still in flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use moka::future::Cache;
use neotech_core::ProductId;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cart::{CancelScope, CartItemController};
use crate::orders::OrderService;
use crate::session::{SessionStore, UserService};
use crate::storage::{FileStorage, LocalStorage, MemoryStorage};
use crate::store::Store;

/// How long an untouched shopper is kept, in seconds (7 days). The browser
/// session cookie expires on the same inactivity window, so a live cookie
/// never points at an evicted shopper.
pub const SHOPPER_IDLE_SECONDS: i64 = 7 * 24 * 60 * 60;

pub(crate) const SHOPPER_IDLE: Duration = Duration::from_secs(SHOPPER_IDLE_SECONDS.unsigned_abs());

const MAX_SHOPPERS: u64 = 10_000;

/// Backend a shopper talks to.
pub trait ShopperBackend: UserService + OrderService + Clone {}

impl<T: UserService + OrderService + Clone> ShopperBackend for T {}

/// One shopper's state and services.
pub struct Shopper<C> {
    id: Uuid,
    store: Store,
    session: SessionStore<C>,
    orders: C,
    scope: CancelScope,
    bootstrapping: AtomicBool,
}

impl<C: ShopperBackend> Shopper<C> {
    /// Create a shopper with a fresh store.
    pub fn new(id: Uuid, backend: C, storage: Arc<dyn LocalStorage>) -> Self {
        let store = Store::new();
        Self {
            id,
            session: SessionStore::new(store.clone(), backend.clone(), storage),
            store,
            orders: backend,
            scope: CancelScope::new(),
            bootstrapping: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore<C> {
        &self.session
    }

    /// Controller for one cart line. Its scope is a child of the shopper's.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> CartItemController<C> {
        CartItemController::new(
            product_id,
            self.store.clone(),
            self.orders.clone(),
            self.scope.child(),
        )
    }

    /// Start the session bootstrap in the background unless a user is
    /// already loaded or a bootstrap is running. Returns `true` if one was
    /// started.
    pub fn ensure_bootstrapped(self: &Arc<Self>) -> bool {
        if self.store.with_state(|s| s.session.user_fetched) || self.scope.is_closed() {
            return false;
        }
        if self.bootstrapping.swap(true, Ordering::AcqRel) {
            return false;
        }

        let shopper = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = shopper.scope.cancelled() => {
                    debug!(shopper_id = %shopper.id, "bootstrap abandoned");
                }
                result = shopper.session.bootstrap() => {
                    if let Err(e) = result {
                        warn!(shopper_id = %shopper.id, error = %e, "Session bootstrap failed");
                    }
                }
            }
            shopper.bootstrapping.store(false, Ordering::Release);
        });
        true
    }

    /// Close the shopper's scope. Every line's in-flight request is
    /// abandoned and its line released.
    pub fn teardown(&self) {
        self.scope.close();
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.scope.is_closed()
    }
}

/// Where shoppers keep their local storage.
#[derive(Debug, Clone)]
enum StorageRoot {
    /// `<dir>/shoppers/<shopper id>/`
    Files(PathBuf),
    Memory,
}

/// All live shoppers.
pub struct ShopperRegistry<C> {
    backend: C,
    root: StorageRoot,
    shoppers: Cache<Uuid, Arc<Shopper<C>>>,
}

impl<C: ShopperBackend> ShopperRegistry<C> {
    /// Registry whose shoppers persist under `state_dir`.
    pub fn new(backend: C, state_dir: impl Into<PathBuf>) -> Self {
        Self::build(backend, StorageRoot::Files(state_dir.into()), SHOPPER_IDLE)
    }

    /// Registry whose shoppers keep their storage in memory.
    pub fn in_memory(backend: C) -> Self {
        Self::build(backend, StorageRoot::Memory, SHOPPER_IDLE)
    }

    fn build(backend: C, root: StorageRoot, idle: Duration) -> Self {
        let shoppers = Cache::builder()
            .max_capacity(MAX_SHOPPERS)
            .time_to_idle(idle)
            .eviction_listener(|id: Arc<Uuid>, shopper: Arc<Shopper<C>>, cause| {
                shopper.teardown();
                debug!(shopper_id = %id, ?cause, "Shopper evicted");
            })
            .build();

        Self {
            backend,
            root,
            shoppers,
        }
    }

    /// Shopper for `id`, created (and its bootstrap started) on first use.
    pub async fn get_or_create(&self, id: Uuid) -> Arc<Shopper<C>> {
        let shopper = self
            .shoppers
            .get_with(id, async {
                info!(shopper_id = %id, "New shopper");
                Arc::new(Shopper::new(id, self.backend.clone(), self.storage_for(id)))
            })
            .await;
        shopper.ensure_bootstrapped();
        shopper
    }

    /// Drop a shopper, tearing down its in-flight requests.
    pub async fn remove(&self, id: Uuid) {
        self.shoppers.invalidate(&id).await;
    }

    fn storage_for(&self, id: Uuid) -> Arc<dyn LocalStorage> {
        match &self.root {
            StorageRoot::Files(dir) => Arc::new(FileStorage::new(
                dir.join("shoppers").join(id.to_string()),
            )),
            StorageRoot::Memory => Arc::new(MemoryStorage::new()),
        }
    }
}

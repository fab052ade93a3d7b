//! Session bootstrap: fetch the shopper's user or create a guest.
//!
//! # Flow
//!
//! 1. Read `userState` from local storage
//! 2. If a user was persisted, fetch it by id
//! 3. Otherwise create a guest user and persist it
//!
//! Only guest creation writes to local storage. A fetched user is already
//! persisted (that is how its id was known), so fetching performs no write.

use std::future::Future;
use std::sync::Arc;

use neotech_core::{User, UserId};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::ApiError;
use crate::notifications::Notification;
use crate::storage::{self, LocalStorage, USER_STATE_KEY};
use crate::store::{Action, Store};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Fetching an existing user failed.
    #[error("Error loading user: {0}")]
    UserFetch(#[source] ApiError),

    /// Creating a guest user failed.
    #[error("Error creating guest user: {0}")]
    UserCreate(#[source] ApiError),
}

/// Remote user operations.
pub trait UserService: Send + Sync + 'static {
    /// Read an existing user.
    fn fetch_user(&self, user_id: UserId) -> impl Future<Output = Result<User, ApiError>> + Send;

    /// Create a guest user.
    fn create_guest_user(&self) -> impl Future<Output = Result<User, ApiError>> + Send;
}

/// Session operations for one shopper.
#[derive(Clone)]
pub struct SessionStore<U> {
    store: Store,
    users: U,
    storage: Arc<dyn LocalStorage>,
}

impl<U: UserService> SessionStore<U> {
    /// Create a session store writing into `store`.
    pub fn new(store: Store, users: U, storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            store,
            users,
            storage,
        }
    }

    /// Fetch an existing user and make it the session user.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UserFetch` on transport failure or any status
    /// other than 200. The session state is left unchanged and an error
    /// notification is queued.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn fetch_user(&self, user_id: UserId) -> Result<User, SessionError> {
        match self.users.fetch_user(user_id).await {
            Ok(user) => {
                self.store.dispatch(Action::UserFetched(user.clone()));
                info!("User fetched");
                Ok(user)
            }
            Err(e) => {
                let notification = if e.is_transport() {
                    Notification::error("Error", "Error loading user")
                } else {
                    Notification::error("Fail", "Something went wrong")
                };
                self.store.dispatch(Action::Notify(notification));
                warn!(error = %e, "Failed to fetch user");
                Err(SessionError::UserFetch(e))
            }
        }
    }

    /// Create a guest user, make it the session user and persist it.
    ///
    /// A failed local-storage write does not fail the operation; it queues
    /// an error notification instead.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UserCreate` if the API call fails. Nothing is
    /// persisted in that case.
    #[instrument(skip(self))]
    pub async fn create_guest_user(&self) -> Result<User, SessionError> {
        let user = match self.users.create_guest_user().await {
            Ok(user) => user,
            Err(e) => {
                self.store.dispatch(Action::Notify(Notification::error(
                    "Error",
                    "Could not start a guest session",
                )));
                warn!(error = %e, "Failed to create guest user");
                return Err(SessionError::UserCreate(e));
            }
        };

        self.store.dispatch(Action::GuestUserCreated(user.clone()));
        self.persist_user(&user);
        info!(user_id = %user.id, "Guest user created");
        Ok(user)
    }

    /// Fetch the persisted user, or create a guest if there is none.
    ///
    /// A persisted document that cannot be read or parsed counts as absent.
    ///
    /// # Errors
    ///
    /// Propagates the error of whichever operation ran.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<User, SessionError> {
        match self.persisted_user() {
            Some(user) => self.fetch_user(user.id).await,
            None => self.create_guest_user().await,
        }
    }

    /// Forget the user: clear local storage, the session slice and the
    /// order map.
    pub fn reset(&self) {
        if let Err(e) = self.storage.remove_item(USER_STATE_KEY) {
            warn!(error = %e, "Failed to clear persisted user");
        }
        self.store.dispatch(Action::SessionReset);
        self.store.dispatch(Action::OrderCleared);
        info!("Session reset");
    }

    /// User currently persisted in local storage.
    #[must_use]
    pub fn persisted_user(&self) -> Option<User> {
        match storage::read_json::<User>(self.storage.as_ref(), USER_STATE_KEY) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable persisted user");
                None
            }
        }
    }

    /// The store this session writes into.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    fn persist_user(&self, user: &User) {
        if let Err(e) = storage::write_json(self.storage.as_ref(), USER_STATE_KEY, user) {
            warn!(error = %e, "Failed to persist user");
            self.store.dispatch(Action::Notify(Notification::error(
                "Error",
                "Error saving state to local storage",
            )));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use neotech_core::{ProductId, QuantityAdjustment};

    use crate::cart::LineLease;
    use crate::notifications::NotificationLevel;
    use crate::storage::{MemoryStorage, StorageError};

    /// Scripted user service.
    #[derive(Default)]
    struct FakeUsers {
        fetch: Mutex<Option<Result<User, u16>>>,
        create: Mutex<Option<Result<User, u16>>>,
        fetch_calls: AtomicUsize,
        create_calls: AtomicUsize,
    }

    fn status_error(status: u16) -> ApiError {
        ApiError::Status {
            status,
            message: String::new(),
        }
    }

    impl UserService for Arc<FakeUsers> {
        async fn fetch_user(&self, _user_id: UserId) -> Result<User, ApiError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.fetch
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Err(500))
                .map_err(status_error)
        }

        async fn create_guest_user(&self) -> Result<User, ApiError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.create
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Err(500))
                .map_err(status_error)
        }
    }

    struct BrokenStorage;

    impl LocalStorage for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(std::io::Error::other("disk full").into())
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn setup() -> (Store, Arc<FakeUsers>, Arc<MemoryStorage>, SessionStore<Arc<FakeUsers>>) {
        let store = Store::new();
        let users = Arc::new(FakeUsers::default());
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionStore::new(store.clone(), Arc::clone(&users), storage.clone());
        (store, users, storage, session)
    }

    fn guest(id: i64) -> User {
        let mut user = User::new(UserId::new(id));
        user.guest = true;
        user
    }

    #[tokio::test]
    async fn test_create_guest_user_persists_once() {
        let (store, users, storage, session) = setup();
        *users.create.lock().unwrap() = Some(Ok(guest(10)));

        let user = session.create_guest_user().await.unwrap();
        assert_eq!(user.id, UserId::new(10));

        let state = store.snapshot().session;
        assert!(!state.loading);
        assert!(state.user_fetched);
        assert_eq!(state.user, Some(guest(10)));

        assert_eq!(storage.write_count(), 1);
        assert_eq!(session.persisted_user(), Some(guest(10)));
    }

    #[tokio::test]
    async fn test_fetch_user_does_not_persist() {
        let (store, users, storage, session) = setup();
        *users.fetch.lock().unwrap() = Some(Ok(User::new(UserId::new(3))));

        session.fetch_user(UserId::new(3)).await.unwrap();

        let state = store.snapshot().session;
        assert!(!state.loading);
        assert!(state.user_fetched);
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state_and_notifies() {
        let (store, users, _storage, session) = setup();
        *users.fetch.lock().unwrap() = Some(Err(404));

        let err = session.fetch_user(UserId::new(3)).await.unwrap_err();
        assert!(matches!(err, SessionError::UserFetch(_)));

        let state = store.snapshot();
        assert!(state.session.loading);
        assert!(!state.session.user_fetched);

        let toasts = store.take_notifications();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, NotificationLevel::Error);
        assert_eq!(toasts[0].message, "Something went wrong");
    }

    #[tokio::test]
    async fn test_failed_create_persists_nothing() {
        let (store, users, storage, session) = setup();
        *users.create.lock().unwrap() = Some(Err(503));

        let err = session.create_guest_user().await.unwrap_err();
        assert!(matches!(err, SessionError::UserCreate(_)));
        assert_eq!(storage.write_count(), 0);
        assert!(store.snapshot().session.loading);
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_user_and_notifies() {
        let store = Store::new();
        let users = Arc::new(FakeUsers::default());
        *users.create.lock().unwrap() = Some(Ok(guest(11)));
        let session = SessionStore::new(store.clone(), users, Arc::new(BrokenStorage));

        session.create_guest_user().await.unwrap();

        assert!(store.snapshot().session.user_fetched);
        let toasts = store.take_notifications();
        assert_eq!(toasts[0].message, "Error saving state to local storage");
    }

    #[tokio::test]
    async fn test_bootstrap_prefers_persisted_user() {
        let (_store, users, storage, session) = setup();
        storage::write_json(storage.as_ref(), USER_STATE_KEY, &guest(21)).unwrap();
        *users.fetch.lock().unwrap() = Some(Ok(guest(21)));

        let user = session.bootstrap().await.unwrap();
        assert_eq!(user.id, UserId::new(21));
        assert_eq!(users.fetch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(users.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_with_corrupt_state_creates_guest() {
        let (_store, users, storage, session) = setup();
        storage.set_item(USER_STATE_KEY, "not json").unwrap();
        *users.create.lock().unwrap() = Some(Ok(guest(30)));

        let user = session.bootstrap().await.unwrap();
        assert_eq!(user.id, UserId::new(30));
        assert_eq!(users.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let (store, users, _storage, session) = setup();
        *users.create.lock().unwrap() = Some(Ok(guest(5)));
        session.create_guest_user().await.unwrap();

        session.reset();

        assert_eq!(session.persisted_user(), None);
        assert!(store.snapshot().session.loading);
    }

    #[tokio::test]
    async fn test_reset_discards_late_cart_updates() {
        let (store, users, _storage, session) = setup();
        *users.create.lock().unwrap() = Some(Ok(guest(5)));
        session.create_guest_user().await.unwrap();

        let pid = ProductId::new(5);
        let lease = LineLease::claim(&store, pid, QuantityAdjustment::AddItem).unwrap();
        session.reset();
        lease.settle(Some(QuantityAdjustment::AddItem));

        let state = store.snapshot();
        assert!(state.session.user.is_none());
        assert_eq!(state.order.items.quantity(pid), 0);
        assert!(!state.order.loading());
    }
}

//! Session bootstrap against the mock Neotech API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use neotech_core::UserId;
use neotech_integration_tests::MockNeotech;
use neotech_storefront::api::ApiClient;
use neotech_storefront::config::ApiConfig;
use neotech_storefront::session::{SessionError, SessionStore};
use neotech_storefront::storage::{FileStorage, LocalStorage, USER_STATE_KEY};
use neotech_storefront::store::Store;

fn session_in(dir: &std::path::Path, client: ApiClient) -> (Store, SessionStore<ApiClient>) {
    let store = Store::new();
    let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(dir));
    let session = SessionStore::new(store.clone(), client, storage);
    (store, session)
}

#[tokio::test]
async fn test_first_run_creates_and_persists_guest() {
    let mock = MockNeotech::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let (store, session) = session_in(dir.path(), mock.client());

    let user = session.bootstrap().await.unwrap();

    assert_eq!(user.id, UserId::new(100));
    assert!(user.guest);
    assert_eq!(mock.state.count("POST users/create_guest_user"), 1);
    assert_eq!(mock.state.count("GET users/"), 0);

    let state = store.snapshot().session;
    assert!(!state.loading);
    assert!(state.user_fetched);
    assert_eq!(session.persisted_user().map(|u| u.id), Some(user.id));
}

#[tokio::test]
async fn test_second_run_fetches_persisted_user() {
    let mock = MockNeotech::spawn().await;
    let dir = tempfile::tempdir().unwrap();

    let (_, first) = session_in(dir.path(), mock.client());
    let guest = first.bootstrap().await.unwrap();

    let (store, second) = session_in(dir.path(), mock.client());
    let fetched = second.bootstrap().await.unwrap();

    assert_eq!(fetched.id, guest.id);
    assert_eq!(mock.state.count("POST users/create_guest_user"), 1);
    assert_eq!(mock.state.count(&format!("GET users/{}", guest.id)), 1);
    assert!(store.snapshot().session.user_fetched);
}

#[tokio::test]
async fn test_fetch_requires_exactly_200() {
    let mock = MockNeotech::spawn().await;
    mock.state.seed_user(7, "Ada");
    mock.state.set_user_status(201);
    let dir = tempfile::tempdir().unwrap();
    let (store, session) = session_in(dir.path(), mock.client());

    let err = session.fetch_user(UserId::new(7)).await.unwrap_err();
    assert!(matches!(err, SessionError::UserFetch(_)));

    let state = store.snapshot();
    assert!(state.session.loading);
    assert!(!state.session.user_fetched);

    let toasts = store.take_notifications();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Fail");
    assert_eq!(toasts[0].message, "Something went wrong");
}

#[tokio::test]
async fn test_fetch_success_does_not_write_storage() {
    let mock = MockNeotech::spawn().await;
    mock.state.seed_user(7, "Ada");
    let dir = tempfile::tempdir().unwrap();
    let (store, session) = session_in(dir.path(), mock.client());

    let user = session.fetch_user(UserId::new(7)).await.unwrap();

    assert_eq!(user.name.as_deref(), Some("Ada"));
    assert!(store.snapshot().session.user_fetched);
    assert!(!dir.path().join(format!("{USER_STATE_KEY}.json")).exists());
}

#[tokio::test]
async fn test_unreachable_api_reports_loading_error() {
    // Nothing listens on port 1.
    let config = ApiConfig::with_base_url("http://127.0.0.1:1/api/v1/").unwrap();
    let client = ApiClient::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let (store, session) = session_in(dir.path(), client);

    assert!(session.fetch_user(UserId::new(1)).await.is_err());

    let toasts = store.take_notifications();
    assert_eq!(toasts[0].title, "Error");
    assert_eq!(toasts[0].message, "Error loading user");
}

#[tokio::test]
async fn test_failed_guest_creation_persists_nothing() {
    let mock = MockNeotech::spawn().await;
    mock.state.set_guest_status(503);
    let dir = tempfile::tempdir().unwrap();
    let (store, session) = session_in(dir.path(), mock.client());

    let err = session.bootstrap().await.unwrap_err();

    assert!(matches!(err, SessionError::UserCreate(_)));
    assert!(session.persisted_user().is_none());
    assert!(store.snapshot().session.loading);
    assert_eq!(store.take_notifications().len(), 1);
}

#[tokio::test]
async fn test_reset_forgets_user() {
    let mock = MockNeotech::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let (store, session) = session_in(dir.path(), mock.client());
    session.bootstrap().await.unwrap();

    session.reset();

    assert!(session.persisted_user().is_none());
    assert!(store.snapshot().session.user.is_none());

    // The next bootstrap starts over with a new guest.
    let again = session.bootstrap().await.unwrap();
    assert_eq!(again.id, UserId::new(101));
}

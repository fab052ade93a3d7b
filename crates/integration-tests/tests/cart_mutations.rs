//! Cart controller over the real HTTP order client.

#![allow(clippy::unwrap_used)]

use neotech_core::{ProductId, User, UserId};
use neotech_integration_tests::MockNeotech;
use neotech_storefront::api::ApiClient;
use neotech_storefront::cart::{CancelScope, CartError, CartItemController};
use neotech_storefront::store::{Action, LineState, Store};

const USER: i64 = 42;

fn signed_in() -> Store {
    let store = Store::new();
    store.dispatch(Action::UserFetched(User::new(UserId::new(USER))));
    store
}

fn controller(store: &Store, mock: &MockNeotech, product_id: i64) -> CartItemController<ApiClient> {
    CartItemController::new(
        ProductId::new(product_id),
        store.clone(),
        mock.client(),
        CancelScope::new(),
    )
}

#[tokio::test]
async fn test_local_quantity_tracks_server() {
    let mock = MockNeotech::spawn().await;
    let store = signed_in();
    let line = controller(&store, &mock, 1);

    assert_eq!(line.add_to_cart().await.unwrap(), 1);
    assert_eq!(line.add_to_cart().await.unwrap(), 2);
    assert_eq!(line.remove_from_cart().await.unwrap(), 1);

    assert_eq!(mock.state.order_quantity(USER, 1), 1);
    assert_eq!(store.snapshot().order.items.quantity(ProductId::new(1)), 1);
    assert_eq!(
        mock.state.requests(),
        vec![
            "POST users/42/order_items 1".to_string(),
            "POST users/42/order_items 1".to_string(),
            "DELETE users/42/order_items/1".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_delete_line_sends_all_flag() {
    let mock = MockNeotech::spawn().await;
    let store = signed_in();
    let line = controller(&store, &mock, 2);
    line.add_to_cart().await.unwrap();
    line.add_to_cart().await.unwrap();

    assert_eq!(line.remove_all_of_item_from_cart().await.unwrap(), 0);

    assert_eq!(mock.state.count("DELETE users/42/order_items/2?all=true"), 1);
    assert_eq!(mock.state.order_quantity(USER, 2), 0);
    assert!(store.snapshot().order.items.get(ProductId::new(2)).is_none());
}

#[tokio::test]
async fn test_rejected_mutation_leaves_map_and_releases_line() {
    let mock = MockNeotech::spawn().await;
    mock.state.reject_orders_for(3);
    let store = signed_in();
    let line = controller(&store, &mock, 3);

    let err = line.add_to_cart().await.unwrap_err();
    assert!(matches!(err, CartError::Mutation(_)));

    let state = store.snapshot();
    assert_eq!(state.order.items.quantity(ProductId::new(3)), 0);
    assert_eq!(state.order.line(ProductId::new(3)), LineState::Idle);
    assert!(!state.order.loading());
    assert_eq!(state.notifications.len(), 1);

    // The released line accepts the next click.
    assert!(matches!(
        line.add_to_cart().await,
        Err(CartError::Mutation(_))
    ));
    assert_eq!(mock.state.count("POST users/42/order_items 3"), 2);
}

#[tokio::test]
async fn test_double_click_sends_one_request() {
    let mock = MockNeotech::spawn().await;
    let store = signed_in();
    let line = controller(&store, &mock, 1);

    let (first, second) = tokio::join!(line.add_to_cart(), line.add_to_cart());

    assert_eq!(first.unwrap(), 1);
    assert!(matches!(second, Err(CartError::LineBusy)));
    assert_eq!(mock.state.count("POST users/42/order_items"), 1);
}

#[tokio::test]
async fn test_add_waits_for_other_lines_but_remove_does_not() {
    let mock = MockNeotech::spawn().await;
    let store = signed_in();
    let keyboard = controller(&store, &mock, 1);
    let mouse = controller(&store, &mock, 2);
    keyboard.add_to_cart().await.unwrap();
    mouse.add_to_cart().await.unwrap();

    let (added, blocked_add, removed) = tokio::join!(
        keyboard.add_to_cart(),
        mouse.add_to_cart(),
        mouse.remove_from_cart(),
    );

    assert_eq!(added.unwrap(), 2);
    assert!(matches!(blocked_add, Err(CartError::OrderBusy)));
    assert_eq!(removed.unwrap(), 0);
}

#[tokio::test]
async fn test_no_user_sends_nothing() {
    let mock = MockNeotech::spawn().await;
    let store = Store::new();
    let line = controller(&store, &mock, 1);

    assert!(matches!(line.add_to_cart().await, Err(CartError::NoUser)));
    assert!(mock.state.requests().is_empty());
}

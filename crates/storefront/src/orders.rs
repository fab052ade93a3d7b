//! Remote order contract consumed by the cart.
//!
//! Each mutation resolves to a settled outcome. The caller decides what a
//! failure means for local state; implementations never touch the store.

use std::future::Future;

use neotech_core::{ProductId, QuantityAdjustment, UserId};

use crate::api::ApiError;

/// Server-side order mutations.
pub trait OrderService: Send + Sync + 'static {
    /// Increment the product's quantity by one.
    fn add_item_to_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Decrement the product's quantity by one. The server keeps it
    /// non-negative.
    fn delete_item_from_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Remove the product's line whatever its quantity.
    fn delete_all_one_item_from_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Issue the remote mutation that pairs with a local adjustment.
pub async fn mutate<O: OrderService>(
    orders: &O,
    user_id: UserId,
    product_id: ProductId,
    adjustment: QuantityAdjustment,
) -> Result<(), ApiError> {
    match adjustment {
        QuantityAdjustment::AddItem => orders.add_item_to_order(user_id, product_id).await,
        QuantityAdjustment::RemoveItem => orders.delete_item_from_order(user_id, product_id).await,
        QuantityAdjustment::DeleteItem => {
            orders
                .delete_all_one_item_from_order(user_id, product_id)
                .await
        }
    }
}

//! Order item endpoints.
//!
//! The server owns the open order; these calls only move one product's
//! quantity and report whether the server accepted the change.

use neotech_core::{ProductId, UserId};
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError, Expect};
use crate::orders::OrderService;

#[derive(Debug, Serialize)]
struct OrderItemBody {
    product_id: ProductId,
}

impl ApiClient {
    /// Increment a product in the user's open order.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_order_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("users/{user_id}/order_items"))?;
        let response = self
            .http()
            .post(url)
            .json(&OrderItemBody { product_id })
            .send()
            .await?;
        Self::read_empty(response, Expect::Success).await
    }

    /// Decrement a product in the user's open order.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_order_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("users/{user_id}/order_items/{product_id}"))?;
        let response = self.http().delete(url).send().await?;
        Self::read_empty(response, Expect::Success).await
    }

    /// Drop a product's line from the user's open order.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_order_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let mut url = self.url(&format!("users/{user_id}/order_items/{product_id}"))?;
        url.query_pairs_mut().append_pair("all", "true");
        let response = self.http().delete(url).send().await?;
        Self::read_empty(response, Expect::Success).await
    }
}

impl OrderService for ApiClient {
    async fn add_item_to_order(&self, user_id: UserId, product_id: ProductId) -> Result<(), ApiError> {
        self.add_order_item(user_id, product_id).await
    }

    async fn delete_item_from_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.remove_order_item(user_id, product_id).await
    }

    async fn delete_all_one_item_from_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.remove_order_line(user_id, product_id).await
    }
}

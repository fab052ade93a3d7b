//! Cart line controller.
//!
//! # Mutation sequence
//!
//! Every cart action (add, remove, delete line) follows the same steps:
//!
//! 1. Claim the line (Idle -> Busy) in one store dispatch
//! 2. Issue the remote order mutation
//! 3. Settle in one store dispatch: apply the local quantity adjustment if
//!    the mutation succeeded, and return the line to Idle in every case
//!
//! The local map is only touched after the server accepted the change.
//! Failures are returned to the caller and queued as a notification; the
//! map is left as it was.

mod lease;
mod scope;
pub mod view;

use neotech_core::{ProductId, QuantityAdjustment, UserId};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::ApiError;
use crate::notifications::Notification;
use crate::orders::{self, OrderService};
use crate::store::{Action, ClaimError, Store};

pub use lease::LineLease;
pub use scope::CancelScope;
pub use view::{CartLineView, QuantityDisplay};

/// Errors from cart actions.
#[derive(Debug, Error)]
pub enum CartError {
    /// The line has a request in flight.
    #[error("This item is already updating")]
    LineBusy,

    /// Another order mutation must settle first.
    #[error("Your order is updating")]
    OrderBusy,

    /// The session has no user yet.
    #[error("Your session is still loading")]
    NoUser,

    /// The line was torn down while the request was in flight.
    #[error("Cart update cancelled")]
    Cancelled,

    /// The server rejected the mutation or could not be reached.
    #[error("Could not update your order: {0}")]
    Mutation(#[source] ApiError),
}

impl CartError {
    /// Whether the action was refused before any request was sent.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::LineBusy | Self::OrderBusy | Self::NoUser)
    }
}

impl From<ClaimError> for CartError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::LineBusy(_) => Self::LineBusy,
            ClaimError::OrderBusy => Self::OrderBusy,
        }
    }
}

/// Controller for one rendered cart line.
pub struct CartItemController<O> {
    product_id: ProductId,
    store: Store,
    orders: O,
    scope: CancelScope,
}

impl<O: OrderService> CartItemController<O> {
    /// Create a controller for `product_id` whose requests stop when `scope`
    /// closes.
    pub const fn new(product_id: ProductId, store: Store, orders: O, scope: CancelScope) -> Self {
        Self {
            product_id,
            store,
            orders,
            scope,
        }
    }

    /// Plus button: increment the product in the order.
    ///
    /// # Errors
    ///
    /// See [`CartError`].
    pub async fn add_to_cart(&self) -> Result<u32, CartError> {
        self.run(QuantityAdjustment::AddItem).await
    }

    /// Minus button: decrement the product in the order.
    ///
    /// # Errors
    ///
    /// See [`CartError`].
    pub async fn remove_from_cart(&self) -> Result<u32, CartError> {
        self.run(QuantityAdjustment::RemoveItem).await
    }

    /// Trash button: drop the product's line from the order.
    ///
    /// # Errors
    ///
    /// See [`CartError`].
    pub async fn remove_all_of_item_from_cart(&self) -> Result<u32, CartError> {
        self.run(QuantityAdjustment::DeleteItem).await
    }

    /// Tear the line down. In-flight requests are abandoned and release the
    /// line without adjusting quantities.
    pub fn teardown(&self) {
        self.scope.close();
    }

    /// Claim, mutate, settle. Returns the line's quantity afterwards.
    #[instrument(skip(self), fields(product_id = %self.product_id, action = adjustment.as_str()))]
    async fn run(&self, adjustment: QuantityAdjustment) -> Result<u32, CartError> {
        if self.scope.is_closed() {
            return Err(CartError::Cancelled);
        }

        let user_id = self.current_user().ok_or_else(|| {
            self.store.dispatch(Action::Notify(Notification::warning(
                "Please wait",
                "Your session is still loading",
            )));
            CartError::NoUser
        })?;

        let lease = LineLease::claim(&self.store, self.product_id, adjustment).map_err(|e| {
            debug!(error = %e, "cart action ignored");
            CartError::from(e)
        })?;

        let outcome = tokio::select! {
            biased;
            () = self.scope.cancelled() => None,
            result = orders::mutate(&self.orders, user_id, self.product_id, adjustment) => Some(result),
        };

        match outcome {
            Some(Ok(())) => {
                lease.settle(Some(adjustment));
                let quantity = self.quantity();
                info!(quantity, "cart line updated");
                Ok(quantity)
            }
            Some(Err(e)) => {
                lease.settle(None);
                warn!(error = %e, "order mutation failed");
                self.store.dispatch(Action::Notify(Notification::error(
                    "Cart not updated",
                    failure_message(adjustment),
                )));
                Err(CartError::Mutation(e))
            }
            None => {
                lease.settle(None);
                debug!("cart line torn down mid-request");
                Err(CartError::Cancelled)
            }
        }
    }

    fn current_user(&self) -> Option<UserId> {
        self.store
            .with_state(|state| state.session.user.as_ref().map(|user| user.id))
    }

    fn quantity(&self) -> u32 {
        self.store
            .with_state(|state| state.order.items.quantity(self.product_id))
    }
}

const fn failure_message(adjustment: QuantityAdjustment) -> &'static str {
    match adjustment {
        QuantityAdjustment::AddItem => "We couldn't add this item. Please try again.",
        QuantityAdjustment::RemoveItem => "We couldn't remove this item. Please try again.",
        QuantityAdjustment::DeleteItem => {
            "We couldn't remove this product from your cart. Please try again."
        }
    }
}

//! Shared shopper state with serialized dispatch.
//!
//! # Architecture
//!
//! The store is a reducer over a [`tokio::sync::watch`] channel. Every state
//! transition goes through [`Store::dispatch`] (or one of the claim/drain
//! helpers), which runs the reducer under the channel's write lock, so
//! transitions are applied one at a time no matter how many cart lines or
//! requests touch the store concurrently. Views read snapshots or subscribe
//! to changes.
//!
//! Reducers are synchronous. Network round-trips happen outside the store;
//! only their settled outcome is dispatched.

mod order;
mod session;

use std::sync::Arc;

use neotech_core::{ProductId, QuantityAdjustment, User};
use tokio::sync::watch;
use tracing::debug;

use crate::notifications::Notification;

pub use order::{ClaimError, LineState, OrderState};
pub use session::SessionState;

/// Everything the views render from.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub session: SessionState,
    pub order: OrderState,
    pub notifications: Vec<Notification>,
}

/// State transitions.
#[derive(Debug, Clone)]
pub enum Action {
    /// `fetchUser` succeeded.
    UserFetched(User),
    /// `createGuestUser` succeeded.
    GuestUserCreated(User),
    /// Logout: back to the initial session state.
    SessionReset,
    /// A line's remote mutation settled. `applied` is the local adjustment
    /// to make, `None` when the mutation failed or was abandoned.
    /// `generation` is the order generation the line was claimed under.
    LineSettled {
        product_id: ProductId,
        applied: Option<QuantityAdjustment>,
        generation: u64,
    },
    /// Checkout or logout.
    OrderCleared,
    /// Queue a toast.
    Notify(Notification),
}

impl Action {
    const fn name(&self) -> &'static str {
        match self {
            Self::UserFetched(_) => "user/fetched",
            Self::GuestUserCreated(_) => "user/guestCreated",
            Self::SessionReset => "user/reset",
            Self::LineSettled { .. } => "order/lineSettled",
            Self::OrderCleared => "order/cleared",
            Self::Notify(_) => "notifications/push",
        }
    }
}

/// Apply one action. Returns `true` if the state changed.
fn reduce(state: &mut StoreState, action: Action) -> bool {
    match action {
        Action::UserFetched(user) | Action::GuestUserCreated(user) => {
            state.session.user_loaded(user);
            true
        }
        Action::SessionReset => {
            state.session = SessionState::default();
            true
        }
        Action::LineSettled {
            product_id,
            applied,
            generation,
        } => state.order.settle(product_id, applied, generation),
        Action::OrderCleared => state.order.clear_items(),
        Action::Notify(notification) => {
            state.notifications.push(notification);
            true
        }
    }
}

/// Handle to a shopper's state. Clones share the same state.
#[derive(Clone)]
pub struct Store {
    tx: Arc<watch::Sender<StoreState>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a store in the initial state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StoreState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Apply an action. Returns `true` if the state changed.
    pub fn dispatch(&self, action: Action) -> bool {
        let name = action.name();
        let changed = self.tx.send_if_modified(|state| reduce(state, action));
        debug!(action = name, changed, "dispatched");
        changed
    }

    /// Try to move a line from Idle to Busy. Returns the order generation
    /// to settle against.
    ///
    /// # Errors
    ///
    /// Returns `ClaimError` if the line (or, for add/delete, the order) is
    /// busy. The state is unchanged in that case.
    pub fn claim_line(
        &self,
        product_id: ProductId,
        adjustment: QuantityAdjustment,
    ) -> Result<u64, ClaimError> {
        let mut result = Err(ClaimError::OrderBusy);
        self.tx.send_if_modified(|state| {
            result = state.order.claim(product_id, adjustment);
            result.is_ok()
        });
        debug!(%product_id, adjustment = adjustment.as_str(), ok = result.is_ok(), "claim line");
        result
    }

    /// Remove and return queued notifications.
    pub fn take_notifications(&self) -> Vec<Notification> {
        let mut taken = Vec::new();
        self.tx.send_if_modified(|state| {
            taken = std::mem::take(&mut state.notifications);
            !taken.is_empty()
        });
        taken
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receiver that observes every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.tx.subscribe()
    }
}

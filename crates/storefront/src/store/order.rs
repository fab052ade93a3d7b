//! Order slice: the local quantity map plus the busy bookkeeping that keeps
//! cart lines from racing themselves.

use std::collections::BTreeMap;

use neotech_core::{OrderItemsMap, ProductId, QuantityAdjustment};
use thiserror::Error;

/// Per-line state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineState {
    #[default]
    Idle,
    /// A remote mutation for this line is in flight.
    Busy(QuantityAdjustment),
}

impl LineState {
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

/// Why a line could not start an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClaimError {
    /// This line already has a request in flight.
    #[error("line {0} is busy")]
    LineBusy(ProductId),
    /// Another order mutation is in flight and this action waits for the
    /// whole order to settle.
    #[error("order is updating")]
    OrderBusy,
}

/// Order items plus loading flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderState {
    pub items: OrderItemsMap,
    busy: BTreeMap<ProductId, QuantityAdjustment>,
    in_flight: usize,
    /// Bumped every time the map is cleared. A line claimed under an older
    /// generation is released on settle but adjusts nothing.
    generation: u64,
}

impl OrderState {
    /// Store-wide `orderLoading` flag: any order mutation in flight.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Current map generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// State of one line.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> LineState {
        self.busy
            .get(&product_id)
            .map_or(LineState::Idle, |adjustment| LineState::Busy(*adjustment))
    }

    /// Move a line from Idle to Busy. Returns the generation the claim
    /// belongs to.
    ///
    /// Add and delete also wait for the whole order to be idle; remove only
    /// needs its own line.
    pub(crate) fn claim(
        &mut self,
        product_id: ProductId,
        adjustment: QuantityAdjustment,
    ) -> Result<u64, ClaimError> {
        if self.busy.contains_key(&product_id) {
            return Err(ClaimError::LineBusy(product_id));
        }

        let gated_by_order = matches!(
            adjustment,
            QuantityAdjustment::AddItem | QuantityAdjustment::DeleteItem
        );
        if gated_by_order && self.loading() {
            return Err(ClaimError::OrderBusy);
        }

        self.busy.insert(product_id, adjustment);
        self.in_flight += 1;
        Ok(self.generation)
    }

    /// Return a Busy line to Idle, applying `adjustment` if the remote side
    /// succeeded and the map has not been cleared since `generation`.
    /// Settling an Idle line does nothing. Returns `true` if the state
    /// changed.
    pub(crate) fn settle(
        &mut self,
        product_id: ProductId,
        adjustment: Option<QuantityAdjustment>,
        generation: u64,
    ) -> bool {
        if self.busy.remove(&product_id).is_none() {
            return false;
        }
        self.in_flight = self.in_flight.saturating_sub(1);

        if let Some(adjustment) = adjustment.filter(|_| generation == self.generation) {
            self.items.apply(product_id, adjustment);
        }
        true
    }

    /// Drop every item (checkout or logout) and start a new generation.
    /// In-flight bookkeeping is kept so outstanding leases still release
    /// cleanly, without touching the new map.
    pub(crate) fn clear_items(&mut self) -> bool {
        self.items.clear();
        self.generation = self.generation.wrapping_add(1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: ProductId = ProductId::new(1);
    const P2: ProductId = ProductId::new(2);

    #[test]
    fn test_claim_marks_line_busy_and_order_loading() {
        let mut order = OrderState::default();
        order.claim(P1, QuantityAdjustment::AddItem).unwrap();

        assert_eq!(order.line(P1), LineState::Busy(QuantityAdjustment::AddItem));
        assert!(order.loading());
        assert_eq!(order.line(P2), LineState::Idle);
    }

    #[test]
    fn test_claim_rejects_busy_line() {
        let mut order = OrderState::default();
        order.claim(P1, QuantityAdjustment::RemoveItem).unwrap();

        assert_eq!(
            order.claim(P1, QuantityAdjustment::RemoveItem),
            Err(ClaimError::LineBusy(P1))
        );
        assert_eq!(order.in_flight, 1);
    }

    #[test]
    fn test_order_loading_gates_add_and_delete_but_not_remove() {
        let mut order = OrderState::default();
        order.claim(P1, QuantityAdjustment::RemoveItem).unwrap();

        assert_eq!(
            order.claim(P2, QuantityAdjustment::AddItem),
            Err(ClaimError::OrderBusy)
        );
        assert_eq!(
            order.claim(P2, QuantityAdjustment::DeleteItem),
            Err(ClaimError::OrderBusy)
        );
        assert!(order.claim(P2, QuantityAdjustment::RemoveItem).is_ok());
        assert_eq!(order.in_flight, 2);
    }

    #[test]
    fn test_settle_applies_adjustment_only_on_success() {
        let mut order = OrderState::default();

        order.claim(P1, QuantityAdjustment::AddItem).unwrap();
        assert!(order.settle(P1, None, 0));
        assert_eq!(order.items.quantity(P1), 0);
        assert!(!order.loading());

        order.claim(P1, QuantityAdjustment::AddItem).unwrap();
        assert!(order.settle(P1, Some(QuantityAdjustment::AddItem), 0));
        assert_eq!(order.items.quantity(P1), 1);
        assert_eq!(order.line(P1), LineState::Idle);
    }

    #[test]
    fn test_settle_idle_line_is_noop() {
        let mut order = OrderState::default();
        assert!(!order.settle(P1, Some(QuantityAdjustment::AddItem), 0));
        assert!(order.items.is_empty());
        assert_eq!(order.in_flight, 0);
    }

    #[test]
    fn test_clear_discards_adjustments_claimed_before_it() {
        let mut order = OrderState::default();
        let stale = order.claim(P1, QuantityAdjustment::AddItem).unwrap();
        order.claim(P2, QuantityAdjustment::RemoveItem).unwrap();

        assert!(order.clear_items());
        assert_eq!(order.generation(), stale + 1);

        assert!(order.settle(P1, Some(QuantityAdjustment::AddItem), stale));
        assert!(order.settle(P2, Some(QuantityAdjustment::RemoveItem), stale));
        assert!(order.items.is_empty());
        assert!(!order.loading());
        assert_eq!(order.line(P1), LineState::Idle);

        let fresh = order.claim(P1, QuantityAdjustment::AddItem).unwrap();
        assert!(order.settle(P1, Some(QuantityAdjustment::AddItem), fresh));
        assert_eq!(order.items.quantity(P1), 1);
    }
}

//! Busy-line lease.
//!
//! Holding a `LineLease` means the line is Busy. The line goes back to Idle
//! exactly once: through [`LineLease::settle`], or on drop if the holder
//! never got that far (error, cancellation, panic, dropped request future).

use neotech_core::{ProductId, QuantityAdjustment};
use tracing::debug;

use crate::store::{Action, ClaimError, Store};

#[must_use = "dropping a lease releases the line immediately"]
pub struct LineLease {
    store: Store,
    product_id: ProductId,
    generation: u64,
    released: bool,
}

impl LineLease {
    /// Claim a line.
    ///
    /// # Errors
    ///
    /// Returns `ClaimError` if the line (or, for add/delete, the order) is
    /// already busy.
    pub fn claim(
        store: &Store,
        product_id: ProductId,
        adjustment: QuantityAdjustment,
    ) -> Result<Self, ClaimError> {
        let generation = store.claim_line(product_id, adjustment)?;
        Ok(Self {
            store: store.clone(),
            product_id,
            generation,
            released: false,
        })
    }

    /// Release the line, applying `applied` to the quantity map in the same
    /// dispatch. If the map was cleared since the claim, only the release
    /// happens.
    pub fn settle(mut self, applied: Option<QuantityAdjustment>) {
        self.release(applied);
    }

    fn release(&mut self, applied: Option<QuantityAdjustment>) {
        if self.released {
            return;
        }
        self.released = true;
        self.store.dispatch(Action::LineSettled {
            product_id: self.product_id,
            applied,
            generation: self.generation,
        });
    }
}

impl Drop for LineLease {
    fn drop(&mut self) {
        if !self.released {
            debug!(product_id = %self.product_id, "line released without settling");
        }
        self.release(None);
    }
}

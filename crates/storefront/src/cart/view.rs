//! What a cart line shows.

use neotech_core::{Product, ProductId};

use crate::store::StoreState;

/// Quantity slot of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityDisplay {
    /// A request for this line is in flight.
    Spinner,
    Count(u32),
    /// Not in the order.
    Hidden,
}

impl QuantityDisplay {
    /// Derive the slot for `product_id` from a store snapshot.
    #[must_use]
    pub fn for_line(state: &StoreState, product_id: ProductId) -> Self {
        if state.order.line(product_id).is_busy() {
            return Self::Spinner;
        }
        match state.order.items.quantity(product_id) {
            0 => Self::Hidden,
            n => Self::Count(n),
        }
    }

    #[must_use]
    pub const fn is_spinner(self) -> bool {
        matches!(self, Self::Spinner)
    }

    /// Quantity to print, if any.
    #[must_use]
    pub const fn count(self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(n),
            Self::Spinner | Self::Hidden => None,
        }
    }
}

/// Template data for one cart line.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: String,
    pub display: QuantityDisplay,
    /// Minus control is dimmed at quantity 1.
    pub minus_dimmed: bool,
    pub busy: bool,
}

impl CartLineView {
    #[must_use]
    pub fn new(product: &Product, state: &StoreState) -> Self {
        let display = QuantityDisplay::for_line(state, product.id);
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            image: product.image.clone(),
            price: product.price.to_string(),
            display,
            minus_dimmed: state.order.items.quantity(product.id) == 1,
            busy: display.is_spinner(),
        }
    }
}

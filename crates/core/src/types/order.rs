//! Order items and the local quantity map.
//!
//! The quantity map mirrors the server-side open order. It only changes
//! through [`QuantityAdjustment`]s, and an entry never holds a zero
//! quantity: decrementing to zero removes the entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ProductId;

/// A line of the open order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Local quantity adjustment applied after a remote order mutation settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuantityAdjustment {
    /// Increment by one.
    AddItem,
    /// Decrement by one.
    RemoveItem,
    /// Drop the whole line.
    DeleteItem,
}

impl QuantityAdjustment {
    /// Stable lowercase name used in logs and templates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddItem => "addItem",
            Self::RemoveItem => "removeItem",
            Self::DeleteItem => "deleteItem",
        }
    }
}

/// Product id -> order item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderItemsMap {
    items: BTreeMap<ProductId, OrderItem>,
}

impl OrderItemsMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity for a product; absent entries count as zero.
    #[must_use]
    pub fn quantity(&self, product_id: ProductId) -> u32 {
        self.items.get(&product_id).map_or(0, |item| item.quantity)
    }

    /// Look up the order item for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&OrderItem> {
        self.items.get(&product_id)
    }

    /// Apply one adjustment. Returns `true` if the map changed.
    pub fn apply(&mut self, product_id: ProductId, adjustment: QuantityAdjustment) -> bool {
        match adjustment {
            QuantityAdjustment::AddItem => {
                let item = self.items.entry(product_id).or_insert(OrderItem {
                    product_id,
                    quantity: 0,
                });
                item.quantity = item.quantity.saturating_add(1);
                true
            }
            QuantityAdjustment::RemoveItem => match self.items.get_mut(&product_id) {
                Some(item) if item.quantity > 1 => {
                    item.quantity -= 1;
                    true
                }
                Some(_) => {
                    self.items.remove(&product_id);
                    true
                }
                None => false,
            },
            QuantityAdjustment::DeleteItem => self.items.remove(&product_id).is_some(),
        }
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate over entries in product id order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.values()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.values().map(|item| item.quantity).sum()
    }
}

impl FromIterator<OrderItem> for OrderItemsMap {
    fn from_iter<I: IntoIterator<Item = OrderItem>>(iter: I) -> Self {
        Self {
            items: iter
                .into_iter()
                .filter(|item| item.quantity > 0)
                .map(|item| (item.product_id, item))
                .collect(),
        }
    }
}

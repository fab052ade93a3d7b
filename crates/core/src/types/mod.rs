//! Core types for Neotech.
//!
//! This module provides type-safe wrappers for the storefront's domain
//! concepts.

pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod user;

pub use id::*;
pub use order::{OrderItem, OrderItemsMap, QuantityAdjustment};
pub use price::Price;
pub use product::Product;
pub use user::User;

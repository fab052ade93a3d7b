//! Neotech Core - Shared domain types.
//!
//! This crate provides the types shared by every Neotech component:
//! - `storefront` - Server-rendered storefront client for the Neotech API
//! - `cli` - Headless shopper commands (session bootstrap, cart mutations)
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no HTTP clients, no storage. This keeps it lightweight and lets the
//! order-item invariants be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, products, users and order items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

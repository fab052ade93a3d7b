//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                - Catalog, each product as a cart line
//! GET  /health                          - Health check
//!
//! # Cart (HTMX fragments)
//! GET  /cart                            - Cart page (lines with quantity > 0)
//! GET  /cart/items/{product_id}         - One line fragment
//! POST /cart/items/{product_id}/add     - Plus button (returns line fragment)
//! POST /cart/items/{product_id}/remove  - Minus button (returns line fragment)
//! POST /cart/items/{product_id}/delete  - Trash button (returns line fragment)
//!
//! # Profile
//! GET  /profile                         - Profile page
//! ```

pub mod cart;
pub mod home;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items/{product_id}", get(cart::line))
        .route("/items/{product_id}/add", post(cart::add))
        .route("/items/{product_id}/remove", post(cart::remove))
        .route("/items/{product_id}/delete", post(cart::delete))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/cart", cart_routes())
        .route("/profile", get(profile::show))
}

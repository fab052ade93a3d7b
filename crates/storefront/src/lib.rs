//! Neotech storefront library.
//!
//! # Architecture
//!
//! - [`store`]: reducer-style shopper state (session slice, order slice,
//!   toast queue) with serialized dispatch
//! - [`session`]: fetch-or-create-guest bootstrap persisted to [`storage`]
//! - [`cart`]: per-line controller sequencing remote order mutations with
//!   local quantity adjustments
//! - [`api`]: Neotech REST client implementing the user and order seams
//! - [`routes`]: axum + askama + HTMX surface over one [`shopper::Shopper`]
//!   per browser session
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod notifications;
pub mod orders;
pub mod profile;
pub mod routes;
pub mod session;
pub mod shopper;
pub mod state;
pub mod storage;
pub mod store;

use axum::{Router, http::Request, middleware::from_fn, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Directory static assets are served from, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the full storefront router.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    shopper_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

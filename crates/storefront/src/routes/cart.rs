//! Cart route handlers.
//!
//! Each cart line is an HTMX fragment. The plus, minus and trash buttons
//! post to the line's action route, which runs the mutation through the
//! shopper's cart controller and answers with the re-rendered line plus any
//! queued toasts (swapped out of band).

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use neotech_core::{Product, ProductId, QuantityAdjustment};
use tracing::{debug, instrument, warn};

use crate::api::ApiClient;
use crate::cart::{CartError, CartLineView};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CurrentShopper;
use crate::notifications::Notification;
use crate::shopper::Shopper;
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub lines: Vec<CartLineView>,
    pub session_loading: bool,
    pub cart_count: u32,
    pub toasts: Vec<Notification>,
}

/// One cart line plus out-of-band toasts and cart count (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_line_fragment.html")]
pub struct CartLineFragment {
    pub line: CartLineView,
    pub cart_count: u32,
    pub toasts: Vec<Notification>,
}

impl CartLineFragment {
    /// Render `product`'s line from the shopper's current state, draining
    /// queued toasts.
    #[must_use]
    pub fn render(shopper: &Shopper<ApiClient>, product: &Product) -> Self {
        let toasts = shopper.store().take_notifications();
        let (line, cart_count) = shopper.store().with_state(|state| {
            (
                CartLineView::new(product, state),
                state.order.items.total_quantity(),
            )
        });
        Self {
            line,
            cart_count,
            toasts,
        }
    }
}

/// Display the cart page: every line with a positive quantity.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    CurrentShopper(shopper): CurrentShopper,
) -> Result<CartShowTemplate> {
    let products = state.api().list_products().await?;
    let toasts = shopper.store().take_notifications();
    let snapshot = shopper.store().snapshot();

    let lines = snapshot
        .order
        .items
        .iter()
        .filter_map(|item| {
            let product = products.iter().find(|p| p.id == item.product_id);
            if product.is_none() {
                warn!(product_id = %item.product_id, "Order item not in catalog");
            }
            product.map(|p| CartLineView::new(p, &snapshot))
        })
        .collect();

    Ok(CartShowTemplate {
        lines,
        session_loading: snapshot.session.loading,
        cart_count: snapshot.order.items.total_quantity(),
        toasts,
    })
}

/// Render one line (used by the spinner poll).
#[instrument(skip(state, shopper))]
pub async fn line(
    State(state): State<AppState>,
    CurrentShopper(shopper): CurrentShopper,
    Path(product_id): Path<ProductId>,
) -> Result<CartLineFragment> {
    let product = find_product(&state, product_id).await?;
    Ok(CartLineFragment::render(&shopper, &product))
}

/// Plus button.
#[instrument(skip(state, shopper))]
pub async fn add(
    State(state): State<AppState>,
    CurrentShopper(shopper): CurrentShopper,
    Path(product_id): Path<ProductId>,
) -> Result<CartLineFragment> {
    run_action(&state, &shopper, product_id, QuantityAdjustment::AddItem).await
}

/// Minus button.
#[instrument(skip(state, shopper))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentShopper(shopper): CurrentShopper,
    Path(product_id): Path<ProductId>,
) -> Result<CartLineFragment> {
    run_action(&state, &shopper, product_id, QuantityAdjustment::RemoveItem).await
}

/// Trash button.
#[instrument(skip(state, shopper))]
pub async fn delete(
    State(state): State<AppState>,
    CurrentShopper(shopper): CurrentShopper,
    Path(product_id): Path<ProductId>,
) -> Result<CartLineFragment> {
    run_action(&state, &shopper, product_id, QuantityAdjustment::DeleteItem).await
}

// =============================================================================
// Helpers
// =============================================================================

async fn find_product(state: &AppState, product_id: ProductId) -> Result<Product> {
    state
        .api()
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))
}

/// Run one cart action and render the line afterwards.
///
/// Cart failures are not HTTP errors: the toast queued by the controller
/// explains them and the fragment shows the unchanged quantity.
async fn run_action(
    state: &AppState,
    shopper: &Arc<Shopper<ApiClient>>,
    product_id: ProductId,
    adjustment: QuantityAdjustment,
) -> Result<CartLineFragment> {
    let product = find_product(state, product_id).await?;
    let controller = shopper.line(product_id);

    let result = match adjustment {
        QuantityAdjustment::AddItem => controller.add_to_cart().await,
        QuantityAdjustment::RemoveItem => controller.remove_from_cart().await,
        QuantityAdjustment::DeleteItem => controller.remove_all_of_item_from_cart().await,
    };

    match result {
        Ok(quantity) => {
            let product_id = product_id.to_string();
            let quantity = quantity.to_string();
            add_breadcrumb(
                "cart",
                adjustment.as_str(),
                Some(&[("product_id", &product_id), ("quantity", &quantity)]),
            );
        }
        Err(e @ (CartError::LineBusy | CartError::OrderBusy | CartError::Cancelled)) => {
            debug!(error = %e, "Cart action skipped");
        }
        Err(e) => warn!(error = %e, "Cart action failed"),
    }

    Ok(CartLineFragment::render(shopper, &product))
}

//! Home page: the product catalog, each product rendered as a cart line.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::cart::CartLineView;
use crate::error::Result;
use crate::filters;
use crate::middleware::CurrentShopper;
use crate::notifications::Notification;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub lines: Vec<CartLineView>,
    pub cart_count: u32,
    pub toasts: Vec<Notification>,
}

/// Display the catalog.
#[instrument(skip(state, shopper))]
pub async fn home(
    State(state): State<AppState>,
    CurrentShopper(shopper): CurrentShopper,
) -> Result<HomeTemplate> {
    let products = state.api().list_products().await?;
    let toasts = shopper.store().take_notifications();

    let (lines, cart_count) = shopper.store().with_state(|snapshot| {
        let lines = products
            .iter()
            .map(|product| CartLineView::new(product, snapshot))
            .collect();
        (lines, snapshot.order.items.total_quantity())
    });

    Ok(HomeTemplate {
        lines,
        cart_count,
        toasts,
    })
}

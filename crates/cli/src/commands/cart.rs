//! `neotech cart` commands.
//!
//! The order map starts empty for every run, so the printed quantity is the
//! local view built from this run's settled mutations. Ctrl+C closes the
//! line's scope: an in-flight request is abandoned and the line released.

use neotech_core::{ProductId, QuantityAdjustment};
use neotech_storefront::cart::{CancelScope, CartError, CartItemController};
use tracing::{info, warn};

use super::Context;

/// Run `adjustment` on `product_id` up to `times` times.
///
/// Stops at the first failed action.
///
/// # Errors
///
/// Returns an error if the session cannot be bootstrapped or an action
/// fails.
pub async fn run(
    ctx: &Context,
    product_id: ProductId,
    adjustment: QuantityAdjustment,
    times: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let bootstrapped = ctx.session.bootstrap().await;
    ctx.flush_notifications();
    let user = bootstrapped?;
    info!(user_id = %user.id, "Session ready");

    let scope = CancelScope::new();
    let line = CartItemController::new(product_id, ctx.store.clone(), ctx.api.clone(), scope.clone());

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning in-flight request");
            scope.close();
        }
    });

    let mut outcome: Result<u32, CartError> = Ok(0);
    for _ in 0..times {
        outcome = match adjustment {
            QuantityAdjustment::AddItem => line.add_to_cart().await,
            QuantityAdjustment::RemoveItem => line.remove_from_cart().await,
            QuantityAdjustment::DeleteItem => line.remove_all_of_item_from_cart().await,
        };
        if outcome.is_err() {
            break;
        }
    }
    interrupt.abort();
    ctx.flush_notifications();

    let quantity = outcome?;
    println!("product {product_id}: quantity {quantity}");
    Ok(())
}

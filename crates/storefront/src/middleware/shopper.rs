//! Shopper extractor.
//!
//! Resolves the browser session to a [`Shopper`], minting a shopper id on
//! the first request. The shopper's session bootstrap starts as soon as it
//! is created.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::Span;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::{AppError, set_sentry_user};
use crate::shopper::Shopper;
use crate::state::AppState;

use super::session::SHOPPER_ID_KEY;

/// The current request's shopper.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentShopper(shopper): CurrentShopper) -> impl IntoResponse {
///     shopper.store().snapshot().order.items.total_quantity().to_string()
/// }
/// ```
pub struct CurrentShopper(pub Arc<Shopper<ApiClient>>);

impl FromRequestParts<AppState> for CurrentShopper {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let id = match session.get::<Uuid>(SHOPPER_ID_KEY).await? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                session.insert(SHOPPER_ID_KEY, id).await?;
                id
            }
        };

        Span::current().record("shopper_id", tracing::field::display(id));

        let shopper = state.shoppers().get_or_create(id).await;
        if let Some(user_id) = shopper
            .store()
            .with_state(|s| s.session.user.as_ref().map(|user| user.id))
        {
            set_sentry_user(&user_id);
        }
        Ok(Self(shopper))
    }
}

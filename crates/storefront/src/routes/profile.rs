//! Profile page.

use askama::Template;
use askama_web::WebTemplate;
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentShopper;
use crate::notifications::Notification;
use crate::profile::ProfileView;

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub view: ProfileView,
    pub cart_count: u32,
    pub toasts: Vec<Notification>,
}

/// Display the profile page. While the session is loading the page shows a
/// placeholder that re-polls until the user is known.
#[instrument(skip(shopper))]
pub async fn show(CurrentShopper(shopper): CurrentShopper) -> ProfileTemplate {
    let toasts = shopper.store().take_notifications();
    let (view, cart_count) = shopper.store().with_state(|state| {
        (
            ProfileView::from_session(&state.session),
            state.order.items.total_quantity(),
        )
    });

    ProfileTemplate {
        view,
        cart_count,
        toasts,
    }
}

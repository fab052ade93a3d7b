//! Profile page model.

use crate::store::SessionState;

/// What the profile page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileView {
    /// Session still loading: placeholder only.
    Loading,
    /// The "YOUR ORDERS:" section. Past orders are hosted by an external
    /// widget, so only the slot is rendered.
    Ready { user_name: String },
}

impl ProfileView {
    #[must_use]
    pub fn from_session(session: &SessionState) -> Self {
        if session.loading {
            return Self::Loading;
        }
        let user_name = session
            .user
            .as_ref()
            .map_or_else(|| "Guest".to_string(), neotech_core::User::display_name);
        Self::Ready { user_name }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

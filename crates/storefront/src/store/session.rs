//! Session slice: who the shopper is and whether that is known yet.

use neotech_core::User;

/// User-loading state.
///
/// Starts as `loading: true, user_fetched: false` and moves to
/// `loading: false, user_fetched: true` once a user is fetched or created.
/// A failed fetch leaves it untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub loading: bool,
    pub user_fetched: bool,
    pub user: Option<User>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            loading: true,
            user_fetched: false,
            user: None,
        }
    }
}

impl SessionState {
    /// Record a fetched or freshly created user.
    pub(crate) fn user_loaded(&mut self, user: User) {
        self.loading = false;
        self.user_fetched = true;
        self.user = Some(user);
    }
}

//! Browser session layer.
//!
//! Sessions only carry the shopper id; everything else lives in the shopper
//! registry and the shopper's local storage, so an in-memory session store
//! is enough.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;
use crate::shopper::SHOPPER_IDLE_SECONDS;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "neotech_session";

/// Session key holding the shopper id.
pub const SHOPPER_ID_KEY: &str = "shopper_id";

/// Session expiry time in seconds. Tied to the shopper registry's idle
/// expiry.
const SESSION_EXPIRY_SECONDS: i64 = SHOPPER_IDLE_SECONDS;

/// Create the session layer.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_always_save(true)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::shopper::SHOPPER_IDLE;

    #[test]
    fn test_session_cookie_and_shopper_expire_together() {
        assert_eq!(
            Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs()),
            SHOPPER_IDLE
        );
        assert!(SHOPPER_IDLE >= Duration::from_secs(24 * 60 * 60));
    }
}

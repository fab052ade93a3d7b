//! `neotech session` commands.

use neotech_core::User;
use tracing::info;

use super::Context;

/// Fetch the persisted user, or create and persist a guest.
///
/// # Errors
///
/// Returns an error if the fetch or guest creation fails.
pub async fn bootstrap(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let result = ctx.session.bootstrap().await;
    ctx.flush_notifications();
    let user = result?;

    info!(user_id = %user.id, "Session ready");
    print_user(&user);
    Ok(())
}

/// Print the persisted user without touching the API.
pub fn show(ctx: &Context) {
    match ctx.session.persisted_user() {
        Some(user) => print_user(&user),
        None => println!("No session in {}", ctx.state_dir.display()),
    }
}

/// Forget the persisted user.
pub fn reset(ctx: &Context) {
    ctx.session.reset();
    ctx.flush_notifications();
    println!("Session cleared");
}

fn print_user(user: &User) {
    let kind = if user.guest { "guest" } else { "user" };
    println!("{} ({kind}) id={}", user.display_name(), user.id);
}

//! Cached admin session commands.

use support_portal::{FirebasePortal, PortalConfig, PortalError};
use support_portal_core::AppView;

use super::CommandError;

/// Print the view the portal would open with.
#[allow(clippy::print_stdout)]
pub async fn show(config: &PortalConfig) -> Result<(), CommandError> {
    let portal = FirebasePortal::from_config(config).await?;
    let view = match portal.initial_view() {
        AppView::Admin => "Admin",
        AppView::Customer => "Customer",
    };
    match &config.session_hint_path {
        Some(path) => println!("{view} view (hint file: {})", path.display()),
        None => println!("{view} view (PORTAL_SESSION_HINT_PATH not set)"),
    }
    Ok(())
}

/// Sign out and clear the cached admin flag.
#[allow(clippy::print_stdout)]
pub async fn logout(config: &PortalConfig) -> Result<(), CommandError> {
    let portal = FirebasePortal::from_config(config).await?;
    portal
        .session()
        .sign_out()
        .await
        .map_err(PortalError::from)?;
    println!("Signed out");
    Ok(())
}

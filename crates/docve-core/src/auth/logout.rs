use anyhow::Result;
use tracing::info;

use super::gate::Route;
use super::store::SessionStore;

/// End the session. Purely local: the token is dropped from the store and the
/// caller is sent to the login screen. The server is not notified.
pub fn logout(store: &dyn SessionStore) -> Result<Route> {
    store.clear()?;
    info!("Logged out");
    Ok(Route::Login)
}

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use super::store::{SessionStore, TOKEN_KEY};

const SERVICE_NAME: &str = "docve";

/// Bearer token kept in the OS keychain under `docve` / `token`.
///
/// The `Entry` is built once and reused, so every call addresses the same
/// credential.
pub struct KeyringSessionStore {
    entry: Entry,
}

impl KeyringSessionStore {
    pub fn new() -> Result<Self> {
        Self::with_service(SERVICE_NAME)
    }

    /// Store entries under a different service name (isolated profiles).
    pub fn with_service(service: &str) -> Result<Self> {
        let entry = Entry::new(service, TOKEN_KEY).context("Failed to create keyring entry")?;
        Ok(Self { entry })
    }
}

impl SessionStore for KeyringSessionStore {
    fn get(&self) -> Option<String> {
        self.entry.get_password().ok()
    }

    fn set(&self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")?;
        debug!("Session token stored in keychain");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_store() -> KeyringSessionStore {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeyringSessionStore::with_service("docve-test").unwrap()
    }

    #[test]
    fn test_set_then_get_returns_token() {
        let store = mock_store();
        assert_eq!(store.get(), None);

        store.set("abc123").unwrap();
        assert_eq!(store.get().as_deref(), Some("abc123"));

        store.set("def456").unwrap();
        assert_eq!(store.get().as_deref(), Some("def456"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = mock_store();
        store.set("abc123").unwrap();
        store.clear().unwrap();
        assert_eq!(store.get(), None);
        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }
}

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Fixed key the bearer token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Durable holder of exactly one bearer token.
///
/// Reads are synchronous point-in-time lookups; there is one writer per user
/// action, so implementations only need interior mutability, not transactions.
pub trait SessionStore: Send + Sync {
    /// Stored token, or `None` when no session exists.
    fn get(&self) -> Option<String>;

    /// Persist `token`, replacing any previous value. The shape is not checked.
    fn set(&self, token: &str) -> Result<()>;

    /// Remove the token. Clearing an empty store succeeds.
    fn clear(&self) -> Result<()>;

    fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

pub type SharedSessionStore = Arc<dyn SessionStore>;

/// Token persisted as `{"token": "..."}` in `session.json`.
///
/// Every `get` re-reads the file, so a clear made through another handle is
/// observed on the next read.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        match self.read_entries() {
            Ok(mut entries) => entries.remove(TOKEN_KEY),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create data directory")?;
        let mut entries = BTreeMap::new();
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        let contents = serde_json::to_string_pretty(&entries)?;
        std::fs::write(self.path(), contents).context("Failed to write session file")?;
        debug!("Session token stored");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
        }
        debug!("Session cleared");
        Ok(())
    }
}

/// In-process store, used by tests and as a throwaway session.
#[derive(Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());

        assert_eq!(store.get(), None);
        store.set("abc123").unwrap();
        assert_eq!(store.get().as_deref(), Some("abc123"));
        // Reads are repeatable
        assert_eq!(store.get().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_file_store_overwrite_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested"));

        store.set("first").unwrap();
        store.set("second").unwrap();
        assert_eq!(store.get().as_deref(), Some("second"));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
        assert!(!store.is_present());

        // Clearing again is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_uses_fixed_key() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        store.set("tok").unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.get(TOKEN_KEY).map(String::as_str), Some("tok"));
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_file_store_sees_clear_from_other_handle() {
        let dir = TempDir::new().unwrap();
        let a = FileSessionStore::new(dir.path().to_path_buf());
        let b = FileSessionStore::new(dir.path().to_path_buf());

        a.set("shared").unwrap();
        assert_eq!(b.get().as_deref(), Some("shared"));
        b.clear().unwrap();
        assert_eq!(a.get(), None);
    }

    #[test]
    fn test_file_store_corrupt_file_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        std::fs::write(store.path(), "not json").unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_file_store_accepts_any_token_shape() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        for token in ["", " spaced ", "a.b.c", "ünïcødé"] {
            store.set(token).unwrap();
            assert_eq!(store.get().as_deref(), Some(token));
        }
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(!store.is_present());
        store.set("abc123").unwrap();
        assert_eq!(store.get().as_deref(), Some("abc123"));
        store.clear().unwrap();
        assert_eq!(store.get(), None);

        let seeded = MemorySessionStore::with_token("seed");
        assert!(seeded.is_present());
    }
}

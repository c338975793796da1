//! Session credential storage.
//!
//! Stores the access/refresh token pair in `<base>/credentials.json` with
//! restricted permissions (0600). Tokens are never logged or displayed in full.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Store key for the short-lived bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Store key for the long-lived refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// A durable key-value store for session credentials.
///
/// Injected into the API client so tests can substitute an in-memory fake.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored value for a key, or `None` if absent.
    fn get(&self, name: &str) -> Option<String>;

    /// Stores a value under a key, overwriting any previous value.
    ///
    /// # Errors
    /// Returns an error if the store cannot be persisted.
    fn set(&self, name: &str, value: &str) -> Result<()>;

    /// Removes a key. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns an error if the store cannot be persisted.
    fn remove(&self, name: &str) -> Result<()>;
}

/// On-disk credential file: a flat string map.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

/// File-backed credential store.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store backed by the given file path.
    /// The file is created lazily on the first `set`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<CredentialsFile> {
        if !self.path.exists() {
            return Ok(CredentialsFile::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", self.path.display()))
    }

    /// Saves the credential file with restricted permissions (0600).
    fn save(&self, file: &CredentialsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(file).context("Failed to serialize credentials")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut out = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            out.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: &str) -> Option<String> {
        match self.load() {
            Ok(file) => file.entries.get(name).cloned(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read credential store");
                None
            }
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        let mut file = self.load()?;
        file.entries.insert(name.to_string(), value.to_string());
        self.save(&file)
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut file = self.load()?;
        if file.entries.remove(name).is_none() {
            return Ok(());
        }
        self.save(&file)
    }
}

/// In-memory credential store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with an access/refresh pair.
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        store
            .set(ACCESS_TOKEN_KEY, access)
            .and_then(|()| store.set(REFRESH_TOKEN_KEY, refresh))
            .expect("memory store set cannot fail");
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: &str) -> Option<String> {
        self.entries.lock().expect("store lock poisoned").get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.entries.lock().expect("store lock poisoned").remove(name);
        Ok(())
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: file store roundtrip through set/get/remove.
    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        assert!(store.get(ACCESS_TOKEN_KEY).is_none());

        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "R1").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));

        store.set(ACCESS_TOKEN_KEY, "A2").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A2"));

        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert!(store.get(ACCESS_TOKEN_KEY).is_none());
        // The other entry survives.
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    }

    /// Test: removing an absent key is a no-op, even before the file exists.
    #[test]
    fn test_file_store_remove_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(path.clone());

        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(path.clone());
        store.set(ACCESS_TOKEN_KEY, "secret").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::with_tokens("A1", "R1");
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));

        store.remove(REFRESH_TOKEN_KEY).unwrap();
        assert!(store.get(REFRESH_TOKEN_KEY).is_none());
    }

    /// Test: token masking.
    #[test]
    fn test_mask_token() {
        assert_eq!(
            mask_token("eyJhbGciOiJIUzI1NiJ9.long-token"),
            "eyJhbGciOiJI..."
        );
        assert_eq!(mask_token("short"), "***");
    }
}

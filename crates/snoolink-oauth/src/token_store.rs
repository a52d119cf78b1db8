//! Credential persistence.
//!
//! A pure persistence delegate: no expiry logic lives here. Single process,
//! single credential; concurrent writers from other processes will race.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::credential::Credential;
use crate::error::{OAuthError, Result};

/// Default token file name.
pub const TOKEN_FILE: &str = "tokens.json";

/// Storage backend for the single active credential.
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Load the stored credential, if any.
    fn load(&self) -> Result<Option<Credential>>;

    /// Persist a credential, replacing any previous one.
    fn save(&self, credential: &Credential) -> Result<()>;

    /// Remove the stored credential. Clearing an empty store succeeds.
    fn clear(&self) -> Result<()>;
}

// ============================================================================
// FileTokenStore
// ============================================================================

/// JSON-file token store.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store at `dir/tokens.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::with_path(dir.join(TOKEN_FILE))
    }

    /// Store at an explicit path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| OAuthError::Storage(format!("Failed to read token file: {}", e)))?;

        match serde_json::from_str::<Credential>(&content) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable token file"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                OAuthError::Storage(format!("Failed to create token directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(credential).map_err(|e| {
            OAuthError::Serialization(format!("Failed to serialize credential: {}", e))
        })?;

        std::fs::write(&self.path, json)
            .map_err(|e| OAuthError::Storage(format!("Failed to write token file: {}", e)))?;

        tracing::debug!(path = %self.path.display(), "Credential saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Credential file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OAuthError::Storage(format!(
                "Failed to delete token file: {}",
                e
            ))),
        }
    }
}

// ============================================================================
// MemoryTokenStore
// ============================================================================

/// In-memory token store for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<Credential>> {
        Ok(self.credential.lock().clone())
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        *self.credential.lock() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.credential.lock() = None;
        Ok(())
    }
}

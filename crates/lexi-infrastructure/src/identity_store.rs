//! File-backed local identity store.
//!
//! The token lives in a small JSON object under the well-known key
//! [`IDENTITY_KEY`]. Writes go through a temporary file and a rename so a
//! crash never leaves a half-written token behind.

use async_trait::async_trait;
use lexi_core::error::{LexiError, Result};
use lexi_core::session::{IdentityStore, InMemoryIdentityStore, LocalIdentity};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Storage key of the local identity token.
pub const IDENTITY_KEY: &str = "app_user_id";

/// Identity store persisted to a JSON file.
///
/// The first storage failure switches the store to memory-only for the rest
/// of the process. The token keeps working until exit but will not survive a
/// restart.
pub struct FileIdentityStore {
    path: PathBuf,
    memory: InMemoryIdentityStore,
    degraded: AtomicBool,
}

impl FileIdentityStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            memory: InMemoryIdentityStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether storage failed and the store fell back to memory.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn degrade(&self, operation: &str, error: &LexiError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                path = %self.path.display(),
                operation,
                error = %error,
                "Identity storage unavailable; keeping identity in memory only"
            );
        }
    }

    async fn read_entries(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(LexiError::Serialization {
                format: "JSON".to_string(),
                message: format!("{} is not a JSON object", self.path.display()),
            }),
        }
    }

    async fn read_identity(&self) -> Result<Option<LocalIdentity>> {
        let entries = self.read_entries().await?;
        Ok(entries
            .get(IDENTITY_KEY)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(LocalIdentity::new))
    }

    async fn write_identity(&self, identity: Option<&LocalIdentity>) -> Result<()> {
        // Keep unrelated keys; a corrupt file is simply replaced.
        let mut entries = self.read_entries().await.unwrap_or_default();
        match identity {
            Some(identity) => {
                entries.insert(
                    IDENTITY_KEY.to_string(),
                    Value::String(identity.as_str().to_string()),
                );
            }
            None => {
                entries.remove(IDENTITY_KEY);
            }
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(entries))?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, permissions).await?;
        }

        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for FileIdentityStore {
    async fn load(&self) -> Option<LocalIdentity> {
        if self.is_degraded() {
            return self.memory.load().await;
        }
        match self.read_identity().await {
            Ok(Some(identity)) => {
                self.memory.save(&identity).await;
                Some(identity)
            }
            Ok(None) => {
                self.memory.clear().await;
                None
            }
            Err(e) => {
                self.degrade("load", &e);
                self.memory.load().await
            }
        }
    }

    async fn save(&self, identity: &LocalIdentity) {
        self.memory.save(identity).await;
        if self.is_degraded() {
            return;
        }
        if let Err(e) = self.write_identity(Some(identity)).await {
            self.degrade("save", &e);
        }
    }

    async fn clear(&self) {
        self.memory.clear().await;
        if self.is_degraded() {
            return;
        }
        if let Err(e) = self.write_identity(None).await {
            self.degrade("clear", &e);
        }
    }
}

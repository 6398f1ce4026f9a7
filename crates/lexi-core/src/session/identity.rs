//! Local identity persistence.

use super::model::LocalIdentity;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Durable storage for the single local-identity token.
///
/// Implementations never fail from the caller's point of view: when the
/// backing storage is unavailable they degrade to keeping the token in memory
/// for the lifetime of the process.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn load(&self) -> Option<LocalIdentity>;

    async fn save(&self, identity: &LocalIdentity);

    async fn clear(&self);
}

/// Process-local identity store.
///
/// Used on its own when no durable storage is configured and as the fallback
/// layer of durable stores.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    token: Mutex<Option<LocalIdentity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: LocalIdentity) -> Self {
        Self {
            token: Mutex::new(Some(identity)),
        }
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn load(&self) -> Option<LocalIdentity> {
        self.token.lock().await.clone()
    }

    async fn save(&self, identity: &LocalIdentity) {
        *self.token.lock().await = Some(identity.clone());
    }

    async fn clear(&self) {
        *self.token.lock().await = None;
    }
}

//! Collaborator contracts consumed by the session manager.

use super::model::{AccountStatus, LocalIdentity};
use crate::error::Result;
use async_trait::async_trait;

/// Reports whether a local identity is linked and to which resource.
#[async_trait]
pub trait AccountStatusService: Send + Sync {
    async fn fetch_status(&self, identity: &LocalIdentity) -> Result<AccountStatus>;
}

/// Binds (or unbinds, with `None`) the destination resource of a linked
/// identity.
#[async_trait]
pub trait ResourceBindingService: Send + Sync {
    async fn bind_resource(&self, identity: &LocalIdentity, resource_id: Option<&str>)
    -> Result<()>;
}

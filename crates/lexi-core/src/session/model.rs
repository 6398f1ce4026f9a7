//! Session domain model.
//!
//! The session reconciles three independent facts: the local identity token
//! of this installation, the external account linked to it and the resource
//! (database) saved results go into. [`LinkState`] is always derived from
//! those facts, never stored.

use serde::{Deserialize, Serialize};

/// Opaque token identifying this client installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalIdentity(String);

impl LocalIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix that is safe to put in logs.
    pub fn fingerprint(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{}…", prefix)
    }
}

impl std::fmt::Display for LocalIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public profile of the linked external account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

/// What is known about the destination resource of a linked account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum ResourceBinding {
    /// Not reported yet.
    #[default]
    Unknown,
    /// Explicitly none selected.
    NoneSelected,
    /// A concrete resource id.
    Selected(String),
}

impl ResourceBinding {
    /// Builds a binding from the wire's tri-state field: missing, `null` or an id.
    pub fn from_wire(value: Option<Option<String>>) -> Self {
        match value {
            None => Self::Unknown,
            Some(None) => Self::NoneSelected,
            Some(Some(id)) => Self::Selected(id),
        }
    }

    pub fn from_selection(resource_id: Option<String>) -> Self {
        match resource_id {
            Some(id) => Self::Selected(id),
            None => Self::NoneSelected,
        }
    }

    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Self::Selected(id) => Some(id),
            _ => None,
        }
    }
}

/// Linkage state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Unlinked,
    /// Linked, destination resource not known yet.
    Linked,
    LinkedNoResource,
    ResourceSelected,
}

impl LinkState {
    pub fn is_linked(&self) -> bool {
        !matches!(self, Self::Unlinked)
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unlinked => "unlinked",
            Self::Linked => "linked",
            Self::LinkedNoResource => "linked (no database selected)",
            Self::ResourceSelected => "linked (database selected)",
        };
        f.write_str(label)
    }
}

/// One selectable destination resource offered by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseChoice {
    pub id: String,
    pub title: String,
}

/// Account data handed to [`super::SessionManager::link`] after a successful
/// code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAccount {
    pub identity: LocalIdentity,
    pub profile: AccountProfile,
    pub external_account_id: Option<String>,
    pub resource: ResourceBinding,
}

/// Answer of the account/resource status service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStatus {
    pub linked: bool,
    pub profile: Option<AccountProfile>,
    pub external_account_id: Option<String>,
    pub resource: ResourceBinding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Linkage {
    pub(super) profile: AccountProfile,
    pub(super) external_account_id: Option<String>,
    pub(super) resource: ResourceBinding,
}

/// The client session.
///
/// Fields are only writable from the `session` module; everything else gets
/// read-only snapshots from [`super::SessionManager::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub(super) local_identity: Option<LocalIdentity>,
    pub(super) linkage: Option<Linkage>,
}

impl Session {
    pub(super) fn unlinked(local_identity: Option<LocalIdentity>) -> Self {
        Self {
            local_identity,
            linkage: None,
        }
    }

    pub(super) fn from_status(identity: LocalIdentity, status: AccountStatus) -> Self {
        if !status.linked {
            return Self::unlinked(Some(identity));
        }
        let profile = status.profile.unwrap_or_else(|| AccountProfile {
            display_name: String::new(),
            avatar_ref: None,
        });
        Self {
            local_identity: Some(identity),
            linkage: Some(Linkage {
                profile,
                external_account_id: status.external_account_id,
                resource: status.resource,
            }),
        }
    }

    pub(super) fn from_account(account: LinkedAccount) -> Self {
        Self {
            local_identity: Some(account.identity),
            linkage: Some(Linkage {
                profile: account.profile,
                external_account_id: account.external_account_id,
                resource: account.resource,
            }),
        }
    }

    pub fn local_identity(&self) -> Option<&LocalIdentity> {
        self.local_identity.as_ref()
    }

    pub fn link_state(&self) -> LinkState {
        match &self.linkage {
            None => LinkState::Unlinked,
            Some(linkage) => match linkage.resource {
                ResourceBinding::Unknown => LinkState::Linked,
                ResourceBinding::NoneSelected => LinkState::LinkedNoResource,
                ResourceBinding::Selected(_) => LinkState::ResourceSelected,
            },
        }
    }

    pub fn account_profile(&self) -> Option<&AccountProfile> {
        self.linkage.as_ref().map(|l| &l.profile)
    }

    pub fn external_account_id(&self) -> Option<&str> {
        self.linkage
            .as_ref()
            .and_then(|l| l.external_account_id.as_deref())
    }

    /// `None` while unlinked; otherwise the tri-state resource binding.
    pub fn resource(&self) -> Option<&ResourceBinding> {
        self.linkage.as_ref().map(|l| &l.resource)
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource().and_then(ResourceBinding::resource_id)
    }
}

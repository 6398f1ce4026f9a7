use super::identity::IdentityStore;
use super::model::{LinkState, LinkedAccount, LocalIdentity, ResourceBinding, Session};
use super::service::{AccountStatusService, ResourceBindingService};
use crate::error::{LexiError, LinkGuidance, Result};
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// Owns the client session and is its only writer.
///
/// `SessionManager` is responsible for:
/// - Hydrating the session from the identity store and the status service
/// - Linking an account after a successful code exchange
/// - Selecting (or clearing) the destination resource
/// - Unlinking
/// - Signalling readiness once hydration finished, whatever the outcome
///
/// Every operation replaces the session in a single write; readers only ever
/// see complete states.
pub struct SessionManager {
    session: RwLock<Session>,
    identity_store: Arc<dyn IdentityStore>,
    status_service: Arc<dyn AccountStatusService>,
    binding_service: Arc<dyn ResourceBindingService>,
    ready: watch::Sender<bool>,
}

impl SessionManager {
    /// Creates a manager with an empty, not-yet-ready session.
    pub fn new(
        identity_store: Arc<dyn IdentityStore>,
        status_service: Arc<dyn AccountStatusService>,
        binding_service: Arc<dyn ResourceBindingService>,
    ) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            session: RwLock::new(Session::default()),
            identity_store,
            status_service,
            binding_service,
            ready,
        }
    }

    /// Hydrates the session.
    ///
    /// Without a stored identity this resolves to `Unlinked` without touching
    /// the network. With one, the status service decides the link state. A
    /// status failure is treated like an invalid identity: the session falls
    /// back to `Unlinked` and the stored token is removed so the user is asked
    /// to link again.
    ///
    /// Readiness is signalled on every path.
    pub async fn initialize(&self) -> LinkState {
        let session = match self.identity_store.load().await {
            None => {
                tracing::info!("No local identity stored; starting unlinked");
                Session::unlinked(None)
            }
            Some(identity) => match self.status_service.fetch_status(&identity).await {
                Ok(status) => {
                    let session = Session::from_status(identity, status);
                    tracing::info!(
                        link_state = %session.link_state(),
                        "Session restored from status service"
                    );
                    session
                }
                Err(e) => {
                    tracing::warn!(
                        identity = %identity.fingerprint(),
                        error = %e,
                        "Status check failed; clearing local identity"
                    );
                    self.identity_store.clear().await;
                    Session::unlinked(None)
                }
            },
        };

        let state = session.link_state();
        *self.session.write().await = session;
        self.ready.send_replace(true);
        state
    }

    /// Replaces the whole linkage with a freshly exchanged account and
    /// persists its identity token.
    pub async fn link(&self, account: LinkedAccount) -> LinkState {
        let identity = account.identity.clone();
        let session = Session::from_account(account);
        let state = session.link_state();

        *self.session.write().await = session;
        self.identity_store.save(&identity).await;

        tracing::info!(
            identity = %identity.fingerprint(),
            link_state = %state,
            "Account linked"
        );
        state
    }

    /// Binds the destination resource, or clears it with `None`.
    ///
    /// The binding service is called first; the session only changes once it
    /// succeeded. On failure the session is left as it was and the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated(ConnectAccount)` if no account is linked
    /// - the binding service's error
    pub async fn select_resource(&self, resource_id: Option<String>) -> Result<LinkState> {
        let identity = {
            let session = self.session.read().await;
            match (&session.linkage, &session.local_identity) {
                (Some(_), Some(identity)) => identity.clone(),
                _ => return Err(LexiError::unauthenticated(LinkGuidance::ConnectAccount)),
            }
        };

        self.binding_service
            .bind_resource(&identity, resource_id.as_deref())
            .await?;

        let state = {
            let mut session = self.session.write().await;
            if session.local_identity.as_ref() != Some(&identity) {
                return Err(LexiError::internal(
                    "session changed while the resource binding was in flight",
                ));
            }
            let mut next = session.clone();
            match next.linkage.as_mut() {
                Some(linkage) => linkage.resource = ResourceBinding::from_selection(resource_id),
                None => return Err(LexiError::unauthenticated(LinkGuidance::ConnectAccount)),
            }
            let state = next.link_state();
            *session = next;
            state
        };
        self.identity_store.save(&identity).await;

        tracing::info!(link_state = %state, "Destination resource updated");
        Ok(state)
    }

    /// Drops the linkage and the persisted identity token.
    pub async fn unlink(&self) {
        *self.session.write().await = Session::unlinked(None);
        self.identity_store.clear().await;
        tracing::info!("Session unlinked");
    }

    /// Returns a copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn link_state(&self) -> LinkState {
        self.session.read().await.link_state()
    }

    /// Returns the identity and resource needed by resource-bound actions.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` with guidance towards linking or resource selection.
    pub async fn require_resource(&self) -> Result<(LocalIdentity, String)> {
        let session = self.session.read().await;
        match (session.local_identity(), session.link_state()) {
            (Some(identity), LinkState::ResourceSelected) => {
                let resource_id = session
                    .resource_id()
                    .ok_or_else(|| LexiError::internal("selected resource without id"))?;
                Ok((identity.clone(), resource_id.to_string()))
            }
            (_, LinkState::Linked | LinkState::LinkedNoResource) => {
                Err(LexiError::unauthenticated(LinkGuidance::SelectResource))
            }
            _ => Err(LexiError::unauthenticated(LinkGuidance::ConnectAccount)),
        }
    }

    /// Whether [`initialize`](Self::initialize) has completed at least once.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Receiver for the readiness gate.
    pub fn ready_signal(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    /// Waits until initialization has completed.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    pub(crate) fn identity_store(&self) -> &Arc<dyn IdentityStore> {
        &self.identity_store
    }
}

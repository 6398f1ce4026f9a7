use super::model::{
    CallbackOutcome, LinkPhase, LinkRedirect, PendingLinkAttempt, extract_authorization_code,
    fingerprint,
};
use super::provider::LinkProvider;
use crate::error::{LexiError, Result};
use crate::session::{DatabaseChoice, LinkState, LinkedAccount, SessionManager};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

struct LinkerState {
    phase: LinkPhase,
    pending: Option<PendingLinkAttempt>,
    /// Every code this client has tried to exchange.
    attempted_codes: HashSet<String>,
    /// Choices returned by the last successful exchange; `None` until one
    /// happened in this process.
    choices: Option<Vec<DatabaseChoice>>,
}

/// Drives the redirect-based linking flow on top of [`SessionManager`].
///
/// Callbacks may be delivered more than once (revisited history entries,
/// duplicated effects). Each authorization code is exchanged at most once per
/// linker; repeats re-derive the outcome from the session instead.
pub struct OAuthLinker {
    session: Arc<SessionManager>,
    provider: Arc<dyn LinkProvider>,
    state: Mutex<LinkerState>,
}

impl OAuthLinker {
    pub fn new(session: Arc<SessionManager>, provider: Arc<dyn LinkProvider>) -> Self {
        Self {
            session,
            provider,
            state: Mutex::new(LinkerState {
                phase: LinkPhase::Idle,
                pending: None,
                attempted_codes: HashSet::new(),
                choices: None,
            }),
        }
    }

    pub async fn phase(&self) -> LinkPhase {
        self.state.lock().await.phase
    }

    pub async fn pending_attempt(&self) -> Option<PendingLinkAttempt> {
        self.state.lock().await.pending.clone()
    }

    /// Resources offered by the last successful exchange, if any happened.
    pub async fn selectable_resources(&self) -> Option<Vec<DatabaseChoice>> {
        self.state.lock().await.choices.clone()
    }

    /// Starts (or restarts) linking.
    ///
    /// A stored identity is attached to the connect request so the provider
    /// links the account to it instead of minting a new one. The returned URL
    /// is where the user has to go next.
    pub async fn begin_link(&self) -> LinkRedirect {
        let identity = self.session.identity_store().load().await;
        let url = self.provider.connect_url(identity.as_ref());

        let mut state = self.state.lock().await;
        state.phase = LinkPhase::AwaitingCallback;
        state.pending = None;

        tracing::info!(reuses_identity = identity.is_some(), "Linking started");
        LinkRedirect {
            url,
            reuses_identity: identity.is_some(),
        }
    }

    /// Handles a callback given as a full URL or a bare code.
    pub async fn handle_callback_url(&self, callback: &str) -> Result<CallbackOutcome> {
        match extract_authorization_code(callback) {
            Ok(code) => self.handle_callback(&code).await,
            Err(e) => {
                self.state.lock().await.phase = LinkPhase::LinkFailed;
                tracing::warn!(error = %e, "Callback rejected");
                Err(e)
            }
        }
    }

    /// Handles the provider's redirect back with an authorization code.
    ///
    /// # Errors
    ///
    /// - `DuplicateCallback` if this code was already seen and the session is
    ///   not linked (yet); recoverable, nothing changed
    /// - `TerminalLink` if the exchange failed for good; the phase moves to
    ///   `LinkFailed` and the user has to call [`begin_link`](Self::begin_link)
    pub async fn handle_callback(&self, authorization_code: &str) -> Result<CallbackOutcome> {
        let code = authorization_code.trim();
        if code.is_empty() {
            self.state.lock().await.phase = LinkPhase::LinkFailed;
            return Err(LexiError::terminal_link("no authorization code in callback"));
        }

        {
            let mut state = self.state.lock().await;
            if !state.attempted_codes.insert(code.to_string()) {
                drop(state);
                return self.rederive_duplicate(code).await;
            }
            let mut pending = PendingLinkAttempt::new(code);
            pending.consumed = true;
            state.pending = Some(pending);
            state.phase = LinkPhase::ExchangingCode;
        }

        tracing::info!(code = %fingerprint(code), "Exchanging authorization code");
        let identity = self.session.identity_store().load().await;
        let result = self.provider.exchange_code(code, identity.as_ref()).await;

        match result {
            Ok(exchange) => {
                let choices = exchange.selectable_resources;
                let link_state = self
                    .session
                    .link(LinkedAccount {
                        identity: exchange.identity,
                        profile: exchange.profile,
                        external_account_id: exchange.external_account_id,
                        resource: exchange.resource,
                    })
                    .await;

                let mut state = self.state.lock().await;
                state.phase = LinkPhase::LinkSucceeded;
                state.pending = None;
                state.choices = Some(choices.clone());
                Ok(outcome_for(link_state, Some(choices)))
            }
            Err(LexiError::CodeAlreadyUsed) => self.recover_consumed_code(code).await,
            Err(e) => {
                tracing::warn!(code = %fingerprint(code), error = %e, "Code exchange failed");
                self.fail_attempt().await;
                Err(LexiError::terminal_link(e.to_string()))
            }
        }
    }

    /// The provider says the code was redeemed already. That happens when the
    /// exchange request itself was duplicated, so a stored identity means an
    /// earlier exchange most likely succeeded: rebuild the session from it.
    async fn recover_consumed_code(&self, code: &str) -> Result<CallbackOutcome> {
        if self.session.identity_store().load().await.is_none() {
            tracing::warn!(
                code = %fingerprint(code),
                "Code already used and no local identity to recover from"
            );
            self.fail_attempt().await;
            return Err(LexiError::terminal_link(
                "authorization code was already used; please link again",
            ));
        }

        tracing::info!(code = %fingerprint(code), "Code already used; re-deriving session");
        let link_state = self.session.initialize().await;

        let mut state = self.state.lock().await;
        state.pending = None;
        if link_state.is_linked() {
            state.phase = LinkPhase::LinkSucceeded;
            Ok(outcome_for(link_state, state.choices.clone()))
        } else {
            state.phase = LinkPhase::LinkFailed;
            Err(LexiError::terminal_link(
                "authorization code was already used and the account is not linked",
            ))
        }
    }

    async fn rederive_duplicate(&self, code: &str) -> Result<CallbackOutcome> {
        let link_state = self.session.link_state().await;
        tracing::debug!(
            code = %fingerprint(code),
            link_state = %link_state,
            "Duplicate callback ignored"
        );
        if link_state.is_linked() {
            let choices = self.state.lock().await.choices.clone();
            Ok(outcome_for(link_state, choices))
        } else {
            Err(LexiError::DuplicateCallback)
        }
    }

    async fn fail_attempt(&self) {
        let mut state = self.state.lock().await;
        state.phase = LinkPhase::LinkFailed;
        state.pending = None;
    }
}

fn outcome_for(link_state: LinkState, choices: Option<Vec<DatabaseChoice>>) -> CallbackOutcome {
    match link_state {
        LinkState::ResourceSelected => CallbackOutcome::ProceedToMain,
        _ => CallbackOutcome::SelectResource { choices },
    }
}

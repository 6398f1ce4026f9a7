//! Account linking through the provider's OAuth redirect flow.
//!
//! - `model`: phases, pending attempt and outcome types
//! - `provider`: the token-exchange collaborator (`LinkProvider`)
//! - `linker`: the state machine (`OAuthLinker`)

mod linker;
mod model;
mod provider;

pub use linker::OAuthLinker;
pub use model::{
    CallbackOutcome, ExchangeResult, LinkPhase, LinkRedirect, PendingLinkAttempt,
    extract_authorization_code,
};
pub use provider::LinkProvider;

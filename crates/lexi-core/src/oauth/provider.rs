use super::model::ExchangeResult;
use crate::error::Result;
use crate::session::LocalIdentity;
use async_trait::async_trait;

/// The external OAuth provider, as seen through the backend.
///
/// Authorization codes are single use. Redeeming one twice must fail with
/// [`crate::LexiError::CodeAlreadyUsed`] so the linker can tell a duplicated
/// exchange apart from a real rejection.
#[async_trait]
pub trait LinkProvider: Send + Sync {
    /// URL that starts the provider's consent screen. With an identity the
    /// new linkage attaches to it; without one the backend mints a fresh one.
    fn connect_url(&self, identity: Option<&LocalIdentity>) -> String;

    async fn exchange_code(
        &self,
        authorization_code: &str,
        identity: Option<&LocalIdentity>,
    ) -> Result<ExchangeResult>;
}

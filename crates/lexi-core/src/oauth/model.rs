//! Types for the redirect-based account linking flow.

use crate::error::{LexiError, Result};
use crate::session::{AccountProfile, DatabaseChoice, LocalIdentity, ResourceBinding};
use serde::{Deserialize, Serialize};

/// Phase of the current linking attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkPhase {
    Idle,
    /// The user was sent to the provider. The process may be replaced before
    /// the callback arrives; only the identity store survives that gap.
    AwaitingCallback,
    ExchangingCode,
    LinkSucceeded,
    /// Terminal for the attempt, not for the session: `begin_link` starts over.
    LinkFailed,
}

/// The callback currently being exchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLinkAttempt {
    pub authorization_code: String,
    pub consumed: bool,
}

impl PendingLinkAttempt {
    pub fn new(authorization_code: impl Into<String>) -> Self {
        Self {
            authorization_code: authorization_code.into(),
            consumed: false,
        }
    }
}

/// Short prefix of an authorization code that is safe to put in logs.
pub(crate) fn fingerprint(code: &str) -> String {
    let prefix: String = code.chars().take(6).collect();
    format!("{}…", prefix)
}

/// Successful answer of the token-exchange endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResult {
    pub identity: LocalIdentity,
    pub profile: AccountProfile,
    pub external_account_id: Option<String>,
    pub resource: ResourceBinding,
    pub selectable_resources: Vec<DatabaseChoice>,
}

/// Where the user goes to start linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRedirect {
    pub url: String,
    /// Whether the existing local identity was attached to the request.
    pub reuses_identity: bool,
}

/// Where the user goes after a callback was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Linked with a destination resource; continue to the main experience.
    ProceedToMain,
    /// Linked without a resource; pick one of these. `None` when the list is
    /// unknown, e.g. after the session was re-derived instead of exchanged.
    SelectResource {
        choices: Option<Vec<DatabaseChoice>>,
    },
}

/// Pulls the authorization code out of a callback.
///
/// Accepts either the full callback URL or the bare code. A provider-reported
/// `error` parameter or a missing code ends the attempt.
pub fn extract_authorization_code(callback: &str) -> Result<String> {
    let callback = callback.trim();
    let Ok(url) = reqwest::Url::parse(callback) else {
        if callback.is_empty() {
            return Err(LexiError::terminal_link("no authorization code in callback"));
        }
        return Ok(callback.to_string());
    };

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "error" => {
                return Err(LexiError::terminal_link(format!(
                    "provider denied access: {}",
                    value
                )));
            }
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            _ => {}
        }
    }
    code.ok_or_else(|| LexiError::terminal_link("no authorization code in callback"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_code_from_url() {
        let code = extract_authorization_code(
            "http://localhost:5173/oauth/notion/callback?code=abc123&state=xyz",
        )
        .unwrap();
        assert_eq!(code, "abc123");
    }

    #[test]
    fn test_extract_bare_code() {
        assert_eq!(extract_authorization_code("  abc123 ").unwrap(), "abc123");
    }

    #[test]
    fn test_missing_code_is_terminal() {
        let err = extract_authorization_code("http://localhost:5173/oauth/notion/callback")
            .unwrap_err();
        assert!(err.is_terminal_link());
        assert!(extract_authorization_code("").unwrap_err().is_terminal_link());
    }

    #[test]
    fn test_provider_error_is_terminal() {
        let err = extract_authorization_code(
            "http://localhost:5173/oauth/notion/callback?error=access_denied",
        )
        .unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }
}

//! Error types for the Lexi client core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the user should be sent when a resource-bound action is attempted
/// without the required linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkGuidance {
    /// No external account is linked yet; start the linking flow.
    ConnectAccount,
    /// An account is linked but no destination resource has been chosen.
    SelectResource,
}

impl std::fmt::Display for LinkGuidance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectAccount => write!(f, "connect your workspace account first"),
            Self::SelectResource => write!(f, "select a destination database first"),
        }
    }
}

/// A shared error type for the entire Lexi client.
///
/// Variants map onto the failure taxonomy used by the session and linking
/// flows: transient network failures, duplicate authorization codes, terminal
/// link failures and unauthenticated operations, plus the usual plumbing
/// errors.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum LexiError {
    /// Transport-level failure talking to a collaborator service.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The collaborator answered with a non-success status.
    #[error("Service error ({status}): {message}")]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The token-exchange endpoint rejected an authorization code that was
    /// already redeemed.
    #[error("Authorization code has already been used")]
    CodeAlreadyUsed,

    /// The same callback was observed again before the session became linked.
    #[error("Authorization callback already in progress; linking is not complete yet")]
    DuplicateCallback,

    /// Linking failed for good; the user has to start over.
    #[error("Linking failed: {0}")]
    TerminalLink(String),

    /// A resource-bound action was attempted without the required linkage.
    #[error("Not linked: {guidance}")]
    Unauthenticated { guidance: LinkGuidance },

    /// The caller supplied unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LexiError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a Service error without a machine-readable code
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Creates a TerminalLink error
    pub fn terminal_link(message: impl Into<String>) -> Self {
        Self::TerminalLink(message.into())
    }

    /// Creates an Unauthenticated error
    pub fn unauthenticated(guidance: LinkGuidance) -> Self {
        Self::Unauthenticated { guidance }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a transport failure
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if this is a duplicate authorization code, from either the
    /// collaborator or the local callback guard
    pub fn is_duplicate_code(&self) -> bool {
        matches!(self, Self::CodeAlreadyUsed | Self::DuplicateCallback)
    }

    /// Check if this is an unauthenticated operation
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated { .. })
    }

    /// Check if this error ends the current linking attempt
    pub fn is_terminal_link(&self) -> bool {
        matches!(self, Self::TerminalLink(_))
    }

    /// Whether the user can recover without restarting the linking flow.
    ///
    /// Recoverable failures are shown as transient notifications; everything
    /// else sends the user back to login or resource selection.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Service { .. }
                | Self::CodeAlreadyUsed
                | Self::DuplicateCallback
                | Self::InvalidInput(_)
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for LexiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for LexiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for LexiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for LexiError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for LexiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Serialization {
                format: "JSON".to_string(),
                message: err.to_string(),
            };
        }
        match err.status() {
            Some(status) => Self::service(status.as_u16(), err.to_string()),
            None => Self::network(err.to_string()),
        }
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for LexiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, LexiError>`.
pub type Result<T> = std::result::Result<T, LexiError>;

//! Core of the Lexi client: session and account linking, debounced queries
//! and saving results into the linked workspace.

pub mod config;
pub mod error;
pub mod notification;
pub mod oauth;
pub mod query;
pub mod save;
pub mod session;

// Re-export common error type
pub use error::{LexiError, LinkGuidance, Result};

//! Infrastructure adapters for the Lexi client: file-backed identity storage,
//! configuration loading and the HTTP backend client.

pub mod config_service;
pub mod dto;
pub mod http_client;
pub mod identity_store;
pub mod paths;

pub use config_service::ConfigService;
pub use http_client::HttpApiClient;
pub use identity_store::FileIdentityStore;
pub use paths::{LexiPaths, PathError};

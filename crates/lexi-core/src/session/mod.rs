//! Session domain module.
//!
//! This module contains the session model, the identity store and collaborator
//! contracts, and the lifecycle logic that ties them together.
//!
//! # Module Structure
//!
//! - `model`: Session state (`Session`, `LinkState`, `ResourceBinding`, ...)
//! - `identity`: Local identity persistence (`IdentityStore`)
//! - `service`: Status and resource-binding collaborator traits
//! - `manager`: Session lifecycle management (`SessionManager`)
//!
//! # Usage
//!
//! ```ignore
//! use lexi_core::session::{SessionManager, LinkState, IdentityStore};
//! ```

mod identity;
mod manager;
mod model;
mod service;

// Re-export public API
pub use identity::{IdentityStore, InMemoryIdentityStore};
pub use manager::SessionManager;
pub use model::{
    AccountProfile, AccountStatus, DatabaseChoice, LinkState, LinkedAccount, LocalIdentity,
    ResourceBinding, Session,
};
pub use service::{AccountStatusService, ResourceBindingService};

//! Debounced word lookup and sentence correction.
//!
//! - `model`: modes, requests and display state
//! - `service`: lookup and correction collaborator traits
//! - `coordinator`: the per-mode debounce and stale-response guard

mod coordinator;
mod model;
mod service;

pub use coordinator::QueryCoordinator;
pub use model::{
    DisplayState, NO_CORRECTION_TEXT, Phonetic, QueryMode, QueryRequest, WordResult,
};
pub use service::{CorrectionService, LookupService};

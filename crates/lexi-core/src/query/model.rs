//! Query types shared by the coordinator and its collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown when the correction service finds nothing to fix.
pub const NO_CORRECTION_TEXT: &str = "No grammatical errors found.";

/// The two lookup modes. Only one is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Dictionary lookup of a single word.
    #[default]
    Word,
    /// Grammar correction of a sentence.
    Sentence,
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Word => write!(f, "word"),
            Self::Sentence => write!(f, "sentence"),
        }
    }
}

/// One dispatched lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub mode: QueryMode,
    pub sequence: u64,
    pub input_snapshot: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phonetic {
    pub text: Option<String>,
    pub audio: Option<String>,
}

/// Dictionary entry for a word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordResult {
    pub definitions: Vec<String>,
    pub synonyms: Vec<String>,
    pub examples: Vec<String>,
    pub phonetics: Vec<Phonetic>,
}

impl WordResult {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
            && self.synonyms.is_empty()
            && self.examples.is_empty()
            && self.phonetics.is_empty()
    }
}

/// What the user currently sees.
///
/// Both modes keep their last applied result; `active` decides which one is
/// rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub active: QueryMode,
    pub word: WordResult,
    /// Input the shown word result belongs to; empty when nothing is shown.
    pub word_query: String,
    /// Corrected sentence; empty when nothing is shown.
    pub correction: String,
}

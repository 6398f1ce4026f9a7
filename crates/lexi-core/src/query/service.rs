use super::model::WordResult;
use crate::error::Result;
use async_trait::async_trait;

/// Dictionary collaborator.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn lookup(&self, word: &str) -> Result<WordResult>;
}

/// Grammar collaborator. Returns the corrected sentence, which may be empty
/// when there is nothing to correct.
#[async_trait]
pub trait CorrectionService: Send + Sync {
    async fn correct(&self, sentence: &str) -> Result<String>;
}

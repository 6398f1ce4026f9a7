//! Saving looked-up words into the linked resource.

use crate::error::{LexiError, Result};
use crate::query::WordResult;
use crate::session::{LocalIdentity, SessionManager};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A word as written into the destination resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    /// Definitions, one per line.
    pub definition: String,
    /// Comma-separated synonyms.
    pub synonyms: String,
}

impl WordEntry {
    pub fn from_result(word: &str, result: &WordResult) -> Self {
        Self {
            word: word.to_string(),
            definition: result.definitions.join("\n"),
            synonyms: result.synonyms.join(", "),
        }
    }
}

/// Collaborator that writes entries into the linked resource.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn save_entry(
        &self,
        identity: &LocalIdentity,
        resource_id: &str,
        entry: &WordEntry,
    ) -> Result<()>;
}

/// Guards the save action: it needs a word with definitions and a session
/// with a selected resource, and only one save runs at a time.
pub struct EntrySaver {
    session: Arc<SessionManager>,
    store: Arc<dyn EntryStore>,
    saving: AtomicBool,
}

struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl EntrySaver {
    pub fn new(session: Arc<SessionManager>, store: Arc<dyn EntryStore>) -> Self {
        Self {
            session,
            store,
            saving: AtomicBool::new(false),
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Saves `word` with its lookup result.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty word, a result without definitions or
    ///   while another save is running
    /// - `Unauthenticated` when the session has no account or no resource
    /// - the entry store's error
    pub async fn save_word(&self, word: &str, result: &WordResult) -> Result<()> {
        let word = word.trim();
        if word.is_empty() || result.definitions.is_empty() {
            return Err(LexiError::invalid_input("a word and its definition are required"));
        }
        let (identity, resource_id) = self.session.require_resource().await?;

        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LexiError::invalid_input("a save is already in progress"));
        }
        let _guard = SavingGuard(&self.saving);

        let entry = WordEntry::from_result(word, result);
        self.store.save_entry(&identity, &resource_id, &entry).await?;
        tracing::info!(word = %entry.word, resource = %resource_id, "Word saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkGuidance;
    use crate::session::{
        AccountProfile, AccountStatus, AccountStatusService, InMemoryIdentityStore,
        LinkedAccount, ResourceBinding, ResourceBindingService,
    };
    use std::sync::Mutex;

    struct NoStatus;

    #[async_trait]
    impl AccountStatusService for NoStatus {
        async fn fetch_status(&self, _identity: &LocalIdentity) -> Result<AccountStatus> {
            Err(LexiError::network("unused"))
        }
    }

    struct NoopBinding;

    #[async_trait]
    impl ResourceBindingService for NoopBinding {
        async fn bind_resource(&self, _: &LocalIdentity, _: Option<&str>) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<(String, String, WordEntry)>>,
    }

    #[async_trait]
    impl EntryStore for RecordingStore {
        async fn save_entry(
            &self,
            identity: &LocalIdentity,
            resource_id: &str,
            entry: &WordEntry,
        ) -> Result<()> {
            self.saved.lock().unwrap().push((
                identity.as_str().to_string(),
                resource_id.to_string(),
                entry.clone(),
            ));
            Ok(())
        }
    }

    fn session() -> Arc<SessionManager> {
        Arc::new(SessionManager::new(
            Arc::new(InMemoryIdentityStore::new()),
            Arc::new(NoStatus),
            Arc::new(NoopBinding),
        ))
    }

    fn account(resource: ResourceBinding) -> LinkedAccount {
        LinkedAccount {
            identity: LocalIdentity::new("tok-1"),
            profile: AccountProfile {
                display_name: "Ada".to_string(),
                avatar_ref: None,
            },
            external_account_id: None,
            resource,
        }
    }

    fn result() -> WordResult {
        WordResult {
            definitions: vec!["a small feline".to_string(), "a jazz musician".to_string()],
            synonyms: vec!["kitty".to_string(), "puss".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_requires_linked_account() {
        let store = Arc::new(RecordingStore::default());
        let saver = EntrySaver::new(session(), store.clone());

        let err = saver.save_word("cat", &result()).await.unwrap_err();

        assert!(matches!(
            err,
            LexiError::Unauthenticated {
                guidance: LinkGuidance::ConnectAccount
            }
        ));
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_requires_selected_resource() {
        let session = session();
        session.link(account(ResourceBinding::NoneSelected)).await;
        let saver = EntrySaver::new(session, Arc::new(RecordingStore::default()));

        let err = saver.save_word("cat", &result()).await.unwrap_err();

        assert!(matches!(
            err,
            LexiError::Unauthenticated {
                guidance: LinkGuidance::SelectResource
            }
        ));
    }

    #[tokio::test]
    async fn test_save_rejects_empty_definitions() {
        let session = session();
        session
            .link(account(ResourceBinding::Selected("db-1".to_string())))
            .await;
        let saver = EntrySaver::new(session, Arc::new(RecordingStore::default()));

        let err = saver.save_word("cat", &WordResult::default()).await.unwrap_err();
        assert!(matches!(err, LexiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_save_formats_entry() {
        let session = session();
        session
            .link(account(ResourceBinding::Selected("db-1".to_string())))
            .await;
        let store = Arc::new(RecordingStore::default());
        let saver = EntrySaver::new(session, store.clone());

        saver.save_word(" cat ", &result()).await.unwrap();

        let saved = store.saved.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        let (identity, resource, entry) = &saved[0];
        assert_eq!(identity, "tok-1");
        assert_eq!(resource, "db-1");
        assert_eq!(entry.word, "cat");
        assert_eq!(entry.definition, "a small feline\na jazz musician");
        assert_eq!(entry.synonyms, "kitty, puss");
        assert!(!saver.is_saving());
    }
}

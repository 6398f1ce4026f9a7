pub mod account;
pub mod interactive;
pub mod query;
mod render;

use anyhow::{Context, Result};
use lexi_core::config::ClientConfig;
use lexi_core::notification::Notifier;
use lexi_core::oauth::OAuthLinker;
use lexi_core::query::QueryCoordinator;
use lexi_core::save::EntrySaver;
use lexi_core::session::SessionManager;
use lexi_infrastructure::{ConfigService, FileIdentityStore, HttpApiClient, LexiPaths};
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs, wired once per process.
pub struct App {
    pub config: ClientConfig,
    pub api: Arc<HttpApiClient>,
    pub session: Arc<SessionManager>,
}

impl App {
    pub async fn load(config_path: Option<&Path>, api_base_url: Option<&str>) -> Result<Self> {
        let paths = LexiPaths::default();
        let config_service = match config_path {
            Some(path) => ConfigService::new(path.to_path_buf()),
            None => ConfigService::new_default()?,
        };
        let config = config_service.load_with_override(api_base_url)?;
        tracing::debug!(
            config = %config_service.path().display(),
            api_base_url = %config.api_base_url,
            "Configuration loaded"
        );

        let identity_path = paths
            .identity_file()
            .context("Cannot resolve identity file location")?;
        let identity_store = Arc::new(FileIdentityStore::new(identity_path));
        let api = Arc::new(HttpApiClient::new(&config)?);
        let session = Arc::new(SessionManager::new(
            identity_store,
            api.clone(),
            api.clone(),
        ));

        Ok(Self {
            config,
            api,
            session,
        })
    }

    pub fn linker(&self) -> OAuthLinker {
        OAuthLinker::new(self.session.clone(), self.api.clone())
    }

    pub fn saver(&self) -> EntrySaver {
        EntrySaver::new(self.session.clone(), self.api.clone())
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.config.notification_duration())
    }

    pub fn coordinator(&self, notifier: Notifier) -> QueryCoordinator {
        QueryCoordinator::new(
            self.api.clone(),
            self.api.clone(),
            notifier,
            self.config.debounce(),
        )
    }
}

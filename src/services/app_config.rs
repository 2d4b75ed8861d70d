use crate::db::repo::AppConfigRepo;
use crate::inventory::{RefreshHandle, TokenProvider};
use crate::models::app_config::AppConfig;
use crate::services::{ServiceError, ServiceResult};
use std::sync::Arc;

pub struct AppConfigService {
    repo: Arc<dyn AppConfigRepo>,
    tokens: Arc<TokenProvider>,
    refresh: RefreshHandle,
}

impl AppConfigService {
    pub fn new(repo: Arc<dyn AppConfigRepo>, tokens: Arc<TokenProvider>, refresh: RefreshHandle) -> Self {
        Self { repo, tokens, refresh }
    }

    /// Stored configuration, or the defaults when nothing was saved yet
    pub async fn get(&self) -> ServiceResult<AppConfig> {
        Ok(self.repo.get().await?.unwrap_or_default())
    }

    /// Applies the persisted admin identity over the bootstrap one from the environment.
    pub async fn load_stored_identity(&self) -> ServiceResult<()> {
        let Some(identity) = self.repo.get().await?.and_then(|c| c.admin_identity()) else {
            return Ok(());
        };

        tracing::info!(
            character_id = %identity.character_id,
            corporation_id = %identity.corporation_id,
            "using stored admin identity"
        );
        self.tokens.set_identity(Some(identity));
        Ok(())
    }

    /// Persists `config`. A changed admin identity takes effect right away and the scheduler is
    /// told to derive a token for it.
    pub async fn update(&self, config: AppConfig) -> ServiceResult<AppConfig> {
        config.validate().map_err(ServiceError::InvalidInput)?;
        self.repo.save(&config).await?;

        let identity = config.admin_identity();
        if identity != self.tokens.identity() {
            self.tokens.set_identity(identity);
            if !self.refresh.token_changed() {
                tracing::warn!("refresh scheduler is not running, identity change applies on restart");
            }
        }

        Ok(config)
    }

    pub fn request_token_refresh(&self) -> bool {
        self.refresh.token_changed()
    }
}

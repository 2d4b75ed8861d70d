use crate::db::DbResult;
use crate::models::app_config::AppConfig;

#[async_trait::async_trait]
pub trait AppConfigRepo: Send + Sync {
    /// Returns the stored configuration, or `None` when nothing has been saved yet
    async fn get(&self) -> DbResult<Option<AppConfig>>;
    async fn save(&self, config: &AppConfig) -> DbResult<()>;
}

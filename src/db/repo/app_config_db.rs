use crate::db::repo::AppConfigRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::app_config::AppConfig;
use std::sync::Arc;

pub struct AppConfigRepository {
    db: Arc<Db>,
}

impl AppConfigRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait::async_trait]
impl AppConfigRepo for AppConfigRepository {
    async fn get(&self) -> DbResult<Option<AppConfig>> {
        let client = self.db.get_client().await?;

        let row_opt = client
            .query_opt("SELECT config FROM app_config WHERE id = 1", &[])
            .await?;

        map_row_opt(
            row_opt,
            |row| {
                let value: serde_json::Value = row.try_get("config")?;
                Ok(serde_json::from_value(value)?)
            },
            "app_config",
        )
    }

    async fn save(&self, config: &AppConfig) -> DbResult<()> {
        let client = self.db.get_client().await?;
        let value = serde_json::to_value(config)?;

        client
            .execute(
                r#"
                INSERT INTO app_config (id, config, updated_at)
                VALUES (1, $1, NOW())
                ON CONFLICT (id)
                DO UPDATE SET config = EXCLUDED.config, updated_at = EXCLUDED.updated_at
                "#,
                &[&value],
            )
            .await?;

        Ok(())
    }
}

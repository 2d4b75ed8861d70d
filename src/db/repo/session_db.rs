use crate::db::repo::SessionRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::account::User;
use crate::models::types::SessionToken;
use std::sync::Arc;

pub struct SessionRepository {
    db: Arc<Db>,
}

impl SessionRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait::async_trait]
impl SessionRepo for SessionRepository {
    async fn user_for_session(&self, token: SessionToken) -> DbResult<Option<User>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
            SELECT c.character_id, c.character_name, c.auth_level
            FROM sessions s
            JOIN characters c ON c.character_id = s.character_id
            WHERE s.token = $1 AND s.expires_at > NOW()
            "#,
            )
            .await?;

        let row_opt = client.query_opt(&stmt, &[&token]).await?;
        map_row_opt(row_opt, User::try_from_row, "user_for_session")
    }
}

use crate::db::Db;
use crate::inventory::token::{CredentialStore, TokenError};
use crate::models::inventory::AdminIdentity;
use std::sync::Arc;

/// Refresh tokens stored by the login flow, one row per character and grant.
pub struct TokenRepository {
    db: Arc<Db>,
}

impl TokenRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait::async_trait]
impl CredentialStore for TokenRepository {
    async fn refresh_credential(&self, identity: &AdminIdentity) -> Result<Option<String>, TokenError> {
        let client = self.db.get_client().await.map_err(|e| TokenError::Store(e.to_string()))?;

        // Newest token whose granted scopes cover every requested scope
        let row_opt = client
            .query_opt(
                r#"
                SELECT t.refresh_token
                FROM tokens t
                WHERE t.character_id = $1
                  AND (
                    SELECT COUNT(DISTINCT ts.scope)
                    FROM token_scopes ts
                    WHERE ts.token_id = t.id AND ts.scope = ANY($2)
                  ) = cardinality($2::text[])
                ORDER BY t.updated_at DESC
                LIMIT 1
                "#,
                &[&identity.character_id, &identity.scopes],
            )
            .await
            .map_err(|e| TokenError::Store(e.to_string()))?;

        Ok(row_opt.map(|row| row.get("refresh_token")))
    }
}

use crate::db::DbResult;
use crate::models::account::User;
use crate::models::types::SessionToken;

#[async_trait::async_trait]
pub trait SessionRepo: Send + Sync {
    /// Looks up the character behind a session token. Expired sessions resolve to `None`.
    async fn user_for_session(&self, token: SessionToken) -> DbResult<Option<User>>;
}

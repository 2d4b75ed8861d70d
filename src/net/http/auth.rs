use crate::Registry;
use crate::error::DomainError;
use crate::models::account::{AuthLevel, User};
use crate::models::types::SessionToken;
use crate::net::http::error::HttpError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;

/// The character behind the `Authorization: Bearer <session>` header.
///
/// Rejects with 401 when the header is missing or the session is unknown or expired, and with 403
/// when the character is known but not whitelisted.
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn require(&self, level: AuthLevel) -> Result<&User, HttpError> {
        if !self.0.has_level(level) {
            return Err(DomainError::PermissionDenied.into());
        }
        Ok(&self.0)
    }
}

fn bearer_token(parts: &Parts) -> Option<SessionToken> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    token.parse().ok()
}

impl FromRequestParts<Arc<Registry>> for AuthUser {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<Registry>) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(DomainError::NotLoggedIn.into());
        };

        let Some(user) = state.repos.session.user_for_session(token).await? else {
            return Err(DomainError::NotLoggedIn.into());
        };

        let auth = AuthUser(user);
        auth.require(AuthLevel::Authorized)?;
        Ok(auth)
    }
}

use crate::models::inventory::AdminIdentity;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Access tokens are re-derived once they get this close to expiring.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("no refresh token stored for the admin character")]
    NoCredential,

    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("credential store: {0}")]
    Store(String),
}

/// Short lived bearer context for ESI calls. Replaced wholesale, never mutated.
#[derive(Clone)]
pub struct AuthContext {
    access_token: Arc<str>,
    expires_at: Instant,
}

impl AuthContext {
    pub fn new(access_token: impl Into<Arc<str>>, lifetime: Duration) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Instant::now() + lifetime,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_usable(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Read-only lookup of the long lived refresh credential.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the refresh token for the identity whose granted scopes cover `identity.scopes`
    async fn refresh_credential(&self, identity: &AdminIdentity) -> Result<Option<String>, TokenError>;
}

#[async_trait::async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, refresh_token: &str) -> Result<AuthContext, TokenError>;
}

pub struct TokenProvider {
    store: Arc<dyn CredentialStore>,
    exchange: Arc<dyn TokenExchange>,
    identity: RwLock<Option<AdminIdentity>>,
    current: RwLock<Option<AuthContext>>,
    last_derivation: Mutex<Option<Instant>>,
}

impl TokenProvider {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        exchange: Arc<dyn TokenExchange>,
        identity: Option<AdminIdentity>,
    ) -> Self {
        Self {
            store,
            exchange,
            identity: RwLock::new(identity),
            current: RwLock::new(None),
            last_derivation: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> Option<AdminIdentity> {
        self.identity.read().clone()
    }

    /// Switches the admin identity. The cached context belongs to the old identity and is dropped,
    /// and the derivation time is reset so the next token change signal is not debounced.
    pub fn set_identity(&self, identity: Option<AdminIdentity>) {
        *self.identity.write() = identity;
        *self.current.write() = None;
        *self.last_derivation.lock() = None;
    }

    /// When the last derivation was attempted, successful or not
    pub fn last_derivation(&self) -> Option<Instant> {
        *self.last_derivation.lock()
    }

    /// Returns the cached context while it is usable, derives a new one otherwise.
    pub async fn acquire(&self) -> Result<AuthContext, TokenError> {
        if let Some(ctx) = self.current.read().as_ref().filter(|c| c.is_usable()) {
            return Ok(ctx.clone());
        }
        self.derive().await
    }

    /// Forces a new derivation. Callers are expected to debounce this.
    pub async fn refresh(&self) -> Result<AuthContext, TokenError> {
        self.derive().await
    }

    /// A failed derivation also drops the cached context, the credential behind it is gone.
    async fn derive(&self) -> Result<AuthContext, TokenError> {
        *self.last_derivation.lock() = Some(Instant::now());

        match self.exchange_credential().await {
            Ok(ctx) => {
                *self.current.write() = Some(ctx.clone());
                Ok(ctx)
            }
            Err(e) => {
                *self.current.write() = None;
                Err(e)
            }
        }
    }

    async fn exchange_credential(&self) -> Result<AuthContext, TokenError> {
        let Some(identity) = self.identity() else {
            return Err(TokenError::NoCredential);
        };

        let refresh_token = self
            .store
            .refresh_credential(&identity)
            .await?
            .ok_or(TokenError::NoCredential)?;

        let ctx = self.exchange.exchange(&refresh_token).await?;
        tracing::info!(
            character_id = %identity.character_id,
            expires_in_secs = ctx.expires_at().saturating_duration_since(Instant::now()).as_secs(),
            "derived admin access token"
        );

        Ok(ctx)
    }
}

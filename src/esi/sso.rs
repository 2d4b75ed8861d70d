use crate::inventory::token::{AuthContext, TokenError, TokenExchange};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Refresh token grant against the EVE SSO.
pub struct SsoTokenExchange {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl SsoTokenExchange {
    pub fn new(
        token_url: &str,
        client_id: &str,
        client_secret: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, TokenError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| TokenError::Exchange(e.to_string()))?;

        Ok(Self {
            http,
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl TokenExchange for SsoTokenExchange {
    async fn exchange(&self, refresh_token: &str) -> Result<AuthContext, TokenError> {
        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await
            .map_err(|e| TokenError::Exchange(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TokenError::Exchange(format!("sso returned {status}: {body}")));
        }

        let token: TokenResponse = resp.json().await.map_err(|e| TokenError::Exchange(e.to_string()))?;
        Ok(AuthContext::new(token.access_token, Duration::from_secs(token.expires_in)))
    }
}

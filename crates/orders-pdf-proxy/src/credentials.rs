//! Graph access token cache with on-demand refresh.
//!
//! Holds one bearer token for the whole process and exchanges the
//! configured client credentials for a new one when the cached token is
//! missing or within `REFRESH_MARGIN_SECS` of expiring.
//!
//! The slot lock is only held to copy or swap the token, never across the
//! exchange itself, so concurrent callers may refresh redundantly and the
//! last one to finish wins.

use async_trait::async_trait;
use chrono::Utc;
use orders_pdf_core::{AccessToken, CredentialError, TokenProvider};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Client credentials for the identity endpoint.
#[derive(Clone)]
pub struct GraphCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Process-wide token cache for Graph calls.
pub struct CredentialCache {
    http: Client,
    credentials: Result<GraphCredentials, CredentialError>,
    slot: RwLock<Option<AccessToken>>,
}

impl CredentialCache {
    pub fn new(http: Client, credentials: Result<GraphCredentials, CredentialError>) -> Self {
        Self {
            http,
            credentials,
            slot: RwLock::new(None),
        }
    }

    /// Whether a token exchange can be attempted at all.
    pub fn is_configured(&self) -> bool {
        self.credentials.is_ok()
    }

    /// Replace the cached token without contacting the identity endpoint.
    pub async fn prime(&self, token: AccessToken) {
        *self.slot.write().await = Some(token);
    }

    async fn cached(&self) -> Option<AccessToken> {
        let guard = self.slot.read().await;
        guard
            .as_ref()
            .filter(|token| token.is_usable_at(Utc::now()))
            .cloned()
    }

    /// Exchange client credentials for a new token and store it.
    #[instrument(skip(self, creds), fields(token_url = %creds.token_url), level = "debug")]
    async fn refresh(&self, creds: &GraphCredentials) -> Result<AccessToken, CredentialError> {
        let resp = self
            .http
            .post(&creds.token_url)
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("grant_type", "client_credentials"),
                ("scope", creds.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CredentialError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!("Token exchange rejected: {}", status);
            return Err(CredentialError::Rejected(format!(
                "{} {}",
                status,
                body.chars().take(512).collect::<String>()
            )));
        }

        let token_resp: TokenResponse = resp
            .json()
            .await
            .map_err(|e| CredentialError::Rejected(format!("invalid token response: {}", e)))?;

        let token = AccessToken::from_lifetime(token_resp.access_token, token_resp.expires_in, Utc::now());
        *self.slot.write().await = Some(token.clone());

        info!("Refreshed Graph access token, expires at {}", token.expires_at.to_rfc3339());
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for CredentialCache {
    async fn get_token(&self) -> Result<AccessToken, CredentialError> {
        let creds = self.credentials.as_ref().map_err(Clone::clone)?;

        if let Some(token) = self.cached().await {
            debug!("Token cache hit");
            return Ok(token);
        }

        debug!("Token missing or near expiry, refreshing");
        self.refresh(creds).await
    }
}

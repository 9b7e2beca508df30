use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;
use orders_pdf_core::CredentialError;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::credentials::GraphCredentials;

/// Configuration for the orders-pdf-proxy server.
#[derive(Parser, Debug, Clone)]
#[command(name = "orders-pdf-proxy")]
#[command(about = "Resolves order PDFs through Microsoft Graph or legacy share URLs and streams them to viewers")]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Port to bind to
    #[arg(long, default_value = "8000", env = "PORT")]
    pub port: u16,

    /// Allowed CORS origins: "*" or a comma-separated list
    #[arg(long, default_value = "*", env = "CORS_ALLOW_ORIGINS")]
    pub cors_allow_origins: String,

    /// Azure AD tenant used for the client-credentials exchange
    #[arg(long, env = "AZURE_TENANT_ID")]
    pub azure_tenant_id: Option<String>,

    /// Azure AD application (client) ID
    #[arg(long, env = "AZURE_CLIENT_ID")]
    pub azure_client_id: Option<String>,

    /// Azure AD client secret
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    pub azure_client_secret: Option<String>,

    /// Drive holding the order documents (required to resolve by item id)
    #[arg(long, env = "GRAPH_DRIVE_ID")]
    pub graph_drive_id: Option<String>,

    /// Microsoft Graph base URL
    #[arg(long, default_value = "https://graph.microsoft.com/v1.0", env = "GRAPH_BASE_URL")]
    pub graph_base_url: String,

    /// Identity authority the token endpoint lives under
    #[arg(long, default_value = "https://login.microsoftonline.com", env = "IDENTITY_AUTHORITY")]
    pub identity_authority: String,

    /// Scope requested in the client-credentials exchange
    #[arg(long, default_value = "https://graph.microsoft.com/.default", env = "GRAPH_SCOPE")]
    pub graph_scope: String,

    /// Upstream connect timeout (seconds)
    #[arg(long, default_value = "20", env = "UPSTREAM_CONNECT_TIMEOUT_SECS")]
    pub upstream_connect_timeout_secs: u64,

    /// Upstream read timeout (seconds): longest wait for response headers or the next body chunk
    #[arg(long, default_value = "60", env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_read_timeout_secs: u64,

    /// Largest document the proxy will serve, in bytes (0 = unlimited)
    #[arg(long, default_value = "104857600", env = "PDF_MAX_BYTES")]
    pub pdf_max_bytes: u64,
}

impl Config {
    /// Graph client credentials, or the first missing setting.
    pub fn graph_credentials(&self) -> Result<GraphCredentials, CredentialError> {
        let tenant_id = required(&self.azure_tenant_id, "AZURE_TENANT_ID")?;
        let client_id = required(&self.azure_client_id, "AZURE_CLIENT_ID")?;
        let client_secret = required(&self.azure_client_secret, "AZURE_CLIENT_SECRET")?;

        Ok(GraphCredentials {
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                self.identity_authority.trim_end_matches('/'),
                tenant_id
            ),
            client_id,
            client_secret,
            scope: self.graph_scope.clone(),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_read_timeout_secs)
    }

    pub fn max_document_bytes(&self) -> Option<u64> {
        (self.pdf_max_bytes > 0).then_some(self.pdf_max_bytes)
    }

    /// CORS layer for the configured origins.
    pub fn cors_layer(&self) -> CorsLayer {
        let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

        if self.cors_allow_origins.trim() == "*" {
            return base.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = self
            .cors_allow_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", o);
                    None
                }
            })
            .collect();

        base.allow_origin(AllowOrigin::list(origins))
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, CredentialError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(CredentialError::NotConfigured(name))
}

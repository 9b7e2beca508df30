//! Common test utilities: fake token provider, mock upstreams, request helpers.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use axum::Router;
use chrono::Utc;
use orders_pdf_core::{share_id, AccessToken, CredentialError, TokenProvider};
use orders_pdf_proxy::fetcher::UpstreamFetcher;
use orders_pdf_proxy::handlers::AppState;
use orders_pdf_proxy::resolver::{GraphEndpoints, Resolver};
use orders_pdf_proxy::router;
use reqwest::Url;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockBuilder, ResponseTemplate};

pub const DRIVE_ID: &str = "drive-1";
pub const TOKEN: &str = "test-token";

/// A small but well-formed PDF.
pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";

pub const LOGIN_PAGE: &str = "<!DOCTYPE html><html><body>Sign in to continue</body></html>";

/// Token provider that always hands out the same long-lived token.
pub struct StaticTokens;

#[async_trait]
impl TokenProvider for StaticTokens {
    async fn get_token(&self) -> Result<AccessToken, CredentialError> {
        Ok(AccessToken::new(TOKEN, Utc::now() + chrono::Duration::hours(1)))
    }
}

/// Token provider whose identity endpoint always refuses.
pub struct RejectingTokens;

#[async_trait]
impl TokenProvider for RejectingTokens {
    async fn get_token(&self) -> Result<AccessToken, CredentialError> {
        Err(CredentialError::Rejected("401 invalid_client".to_string()))
    }
}

pub fn fetcher() -> UpstreamFetcher {
    UpstreamFetcher::new(Duration::from_secs(2), Duration::from_secs(5)).unwrap()
}

/// Graph base URL served by `graph_uri` (a wiremock server).
pub fn graph_base(graph_uri: &str) -> String {
    format!("{}/v1.0", graph_uri)
}

pub fn resolver(graph_uri: &str, tokens: Arc<dyn TokenProvider>, graph_enabled: bool) -> Resolver {
    Resolver::new(
        fetcher(),
        tokens,
        GraphEndpoints {
            base_url: graph_base(graph_uri),
            drive_id: Some(DRIVE_ID.to_string()),
        },
        graph_enabled,
    )
}

pub fn app(resolver: Resolver, max_document_bytes: Option<u64>) -> Router {
    let state = AppState {
        resolver: Arc::new(resolver),
        max_document_bytes,
    };
    router(state, CorsLayer::new())
}

pub fn item_path(item_id: &str) -> String {
    format!("/v1.0/drives/{}/items/{}/content", DRIVE_ID, item_id)
}

pub fn share_path(share_url: &str) -> String {
    format!("/v1.0/shares/{}/driveItem/content", share_id(share_url))
}

/// `GET <path>` mock builder.
pub fn get(p: impl Into<String>) -> MockBuilder {
    Mock::given(method("GET")).and(path(p.into()))
}

pub fn pdf_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(PDF_BYTES, "application/pdf")
}

pub fn html_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(LOGIN_PAGE, "text/html; charset=utf-8")
}

/// `/pdf` URI with properly encoded query parameters.
pub fn pdf_uri(item_id: Option<&str>, legacy_url: Option<&str>) -> String {
    let mut url = Url::parse("http://proxy.test/pdf").unwrap();
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(id) = item_id {
            pairs.append_pair("item_id", id);
        }
        if let Some(legacy) = legacy_url {
            pairs.append_pair("url", legacy);
        }
    }
    match url.query() {
        Some(q) if !q.is_empty() => format!("/pdf?{}", q),
        _ => "/pdf".to_string(),
    }
}

pub async fn send(app: &Router, uri: &str, range: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(range) = range {
        builder = builder.header("Range", range);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

//! HTTP handlers for the PDF proxy.
//!
//! Implements:
//! - GET /pdf?item_id=...&url=... - Resolve and stream an order PDF
//! - GET /health - Health check endpoint

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::Json;
use orders_pdf_core::DocumentIdentifier;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ProxyError;
use crate::resolver::Resolver;
use crate::responder::respond;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub max_document_bytes: Option<u64>,
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub graph_enabled: bool,
}

/// GET /health - Health check endpoint.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        graph_enabled: state.resolver.graph_enabled(),
    })
}

/// GET /pdf - Resolve the document and stream it back.
///
/// 1. Runs the resolution chain for the item id / legacy URL
/// 2. Forwards the inbound `Range` header to whichever upstream answers
/// 3. Streams the body back with normalized status and headers
pub async fn pdf_handler(
    State(state): State<AppState>,
    Query(id): Query<DocumentIdentifier>,
    headers: HeaderMap,
) -> std::result::Result<Response, ProxyError> {
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    debug!(
        "PDF request item_id={:?} url={:?} range={:?}",
        id.item_id(),
        id.legacy_url(),
        range
    );

    let resolved = state.resolver.resolve(&id, range).await?;
    info!(
        "Streaming PDF via {} (range requested: {})",
        resolved.strategy,
        range.is_some()
    );

    respond(resolved.document, range.is_some(), state.max_document_bytes)
}

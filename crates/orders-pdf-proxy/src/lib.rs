//! HTTP proxy that resolves order PDFs and streams them to viewers.
//!
//! This proxy:
//! - Accepts a Graph item id and/or a legacy share URL on GET /pdf
//! - Resolves the document through item id, share link, then direct URL
//! - Caches the Graph access token and refreshes it before expiry
//! - Rejects anything that does not sniff as a PDF
//! - Streams the body back, forwarding Range / Content-Range

pub mod config;
pub mod credentials;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod resolver;
pub mod responder;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use handlers::{health_handler, pdf_handler, AppState};

/// Build the router with its middleware.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/pdf", get(pdf_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

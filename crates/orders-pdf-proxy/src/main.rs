use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orders_pdf_proxy::config::Config;
use orders_pdf_proxy::credentials::CredentialCache;
use orders_pdf_proxy::fetcher::UpstreamFetcher;
use orders_pdf_proxy::handlers::AppState;
use orders_pdf_proxy::resolver::{GraphEndpoints, Resolver};
use orders_pdf_proxy::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    info!("Starting orders-pdf-proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);
    info!(
        "  Upstream timeouts: connect {}s, read {}s",
        config.upstream_connect_timeout_secs, config.upstream_read_timeout_secs
    );
    match config.max_document_bytes() {
        Some(limit) => info!("  Max document size: {} bytes", limit),
        None => info!("  Max document size: unlimited"),
    }

    let fetcher = UpstreamFetcher::new(config.connect_timeout(), config.read_timeout())?;

    let credentials = config.graph_credentials();
    let graph_enabled = match &credentials {
        Ok(_) => {
            info!("  Graph: enabled ({})", config.graph_base_url);
            if config.graph_drive_id.is_none() {
                warn!("  GRAPH_DRIVE_ID not set: item id lookups will fail, share links still work");
            }
            true
        }
        Err(e) => {
            warn!("  Graph: DISABLED ({}), only legacy URLs will resolve", e);
            false
        }
    };

    let tokens = Arc::new(CredentialCache::new(fetcher.client().clone(), credentials));

    let resolver = Resolver::new(
        fetcher,
        tokens,
        GraphEndpoints {
            base_url: config.graph_base_url.clone(),
            drive_id: config.graph_drive_id.clone(),
        },
        graph_enabled,
    );

    let state = AppState {
        resolver: Arc::new(resolver),
        max_document_bytes: config.max_document_bytes(),
    };

    let app = router(state, config.cors_layer());

    // Bind and serve
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received SIGTERM, initiating shutdown");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! Resolution chain: tries each retrieval strategy in priority order.
//!
//! Only a not-found or a validation failure moves on to the next
//! strategy. Upstream errors and credential failures end the request.

use std::sync::Arc;

use orders_pdf_core::{
    is_http_url, DocumentIdentifier, FetchOutcome, RetrievalStrategy, TokenProvider,
};
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::error::{ProxyError, Result};
use crate::fetcher::{FetchedDocument, UpstreamFetcher};

/// Graph endpoint settings.
#[derive(Debug, Clone)]
pub struct GraphEndpoints {
    pub base_url: String,
    pub drive_id: Option<String>,
}

/// A document found by one of the strategies.
#[derive(Debug)]
pub struct ResolvedDocument {
    pub strategy: &'static str,
    pub document: FetchedDocument,
}

pub struct Resolver {
    fetcher: UpstreamFetcher,
    tokens: Arc<dyn TokenProvider>,
    graph: GraphEndpoints,
    graph_enabled: bool,
}

impl Resolver {
    pub fn new(
        fetcher: UpstreamFetcher,
        tokens: Arc<dyn TokenProvider>,
        graph: GraphEndpoints,
        graph_enabled: bool,
    ) -> Self {
        Self {
            fetcher,
            tokens,
            graph,
            graph_enabled,
        }
    }

    pub fn graph_enabled(&self) -> bool {
        self.graph_enabled
    }

    /// Resolve `id` to a PDF, exhausting applicable strategies before failing.
    pub async fn resolve(
        &self,
        id: &DocumentIdentifier,
        range: Option<&str>,
    ) -> Result<ResolvedDocument> {
        if id.is_empty() {
            return Err(ProxyError::MissingIdentifier);
        }
        if let Some(url) = id.legacy_url() {
            if !is_http_url(url) {
                return Err(ProxyError::BadRequest(
                    "url must start with http:// or https://".to_string(),
                ));
            }
        }

        let strategies = RetrievalStrategy::plan(id, self.graph_enabled);
        if strategies.is_empty() {
            return Err(ProxyError::Config(
                "item_id given but Graph access is not configured".to_string(),
            ));
        }

        let mut last: Option<(&'static str, FetchOutcome<FetchedDocument>)> = None;

        for strategy in &strategies {
            let name = strategy.name();
            debug!("Trying strategy {} (priority {})", name, strategy.priority());

            match self.attempt(strategy, range).await? {
                FetchOutcome::Success(document) => {
                    info!("Resolved document via {} (upstream {})", name, document.status);
                    return Ok(ResolvedDocument {
                        strategy: name,
                        document,
                    });
                }
                outcome if outcome.advances_chain() => {
                    warn!("Strategy {} did not yield the document: {}", name, outcome.describe());
                    last = Some((name, outcome));
                }
                outcome => {
                    warn!("Strategy {} failed: {}", name, outcome.describe());
                    return Err(ProxyError::from_outcome(name, &outcome));
                }
            }
        }

        match last {
            Some((name, outcome)) => Err(ProxyError::from_outcome(name, &outcome)),
            None => Err(ProxyError::Internal("no strategy was attempted".to_string())),
        }
    }

    /// Run one strategy. `Err` is reserved for failures that are not strategy outcomes.
    async fn attempt(
        &self,
        strategy: &RetrievalStrategy,
        range: Option<&str>,
    ) -> Result<FetchOutcome<FetchedDocument>> {
        match strategy {
            RetrievalStrategy::ById { item_id } => {
                let drive_id = self.graph.drive_id.as_deref().ok_or_else(|| {
                    ProxyError::Config("GRAPH_DRIVE_ID is required to resolve by item id".to_string())
                })?;
                let url = self.graph_url(&["drives", drive_id, "items", item_id.as_str(), "content"])?;
                let token = self.tokens.get_token().await?;
                Ok(self
                    .fetcher
                    .fetch_document(url.as_str(), Some(&token.value), range)
                    .await)
            }
            RetrievalStrategy::ByShareLink { share_id, .. } => {
                let url = self.graph_url(&["shares", share_id.as_str(), "driveItem", "content"])?;
                let token = self.tokens.get_token().await?;
                Ok(self
                    .fetcher
                    .fetch_document(url.as_str(), Some(&token.value), range)
                    .await)
            }
            RetrievalStrategy::ByLegacyUrl { candidates, .. } => {
                Ok(self.attempt_legacy(candidates, range).await)
            }
        }
    }

    /// Try each download variant of a legacy URL; variants share one strategy slot.
    async fn attempt_legacy(
        &self,
        candidates: &[String],
        range: Option<&str>,
    ) -> FetchOutcome<FetchedDocument> {
        let mut last = FetchOutcome::NotFound {
            detail: "no candidate URLs".to_string(),
        };

        for candidate in candidates {
            let outcome = self.fetcher.fetch_document(candidate, None, range).await;
            if !outcome.advances_chain() {
                return outcome;
            }
            debug!("Legacy candidate {} rejected: {}", candidate, outcome.describe());
            last = outcome;
        }

        last
    }

    fn graph_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.graph.base_url)
            .map_err(|e| ProxyError::Config(format!("Invalid GRAPH_BASE_URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProxyError::Config("GRAPH_BASE_URL cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

use serde::Deserialize;

use crate::legacy::candidate_download_urls;
use crate::share::share_id;

/// What the caller asked for: a stable Graph item id and/or a legacy share URL.
///
/// Deserializes from the proxy's query string (`item_id` or `itemId`, and `url`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentIdentifier {
    #[serde(default, alias = "itemId")]
    item_id: Option<String>,
    #[serde(default, rename = "url", alias = "legacy_url")]
    legacy_url: Option<String>,
}

impl DocumentIdentifier {
    pub fn new(item_id: Option<String>, legacy_url: Option<String>) -> Self {
        Self {
            item_id,
            legacy_url,
        }
    }

    /// Item id, if present and not blank.
    pub fn item_id(&self) -> Option<&str> {
        non_blank(self.item_id.as_deref())
    }

    /// Legacy share URL, if present and not blank.
    pub fn legacy_url(&self) -> Option<&str> {
        non_blank(self.legacy_url.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.item_id().is_none() && self.legacy_url().is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One way of obtaining the document, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// Primary resource endpoint, keyed by the stable item id.
    ById { item_id: String },
    /// Graph share-link endpoint, keyed by the encoded sharing URL.
    ByShareLink { share_url: String, share_id: String },
    /// Direct GET of the legacy URL and its force-download variants.
    ByLegacyUrl { url: String, candidates: Vec<String> },
}

impl RetrievalStrategy {
    /// Lower runs first.
    pub fn priority(&self) -> u8 {
        match self {
            RetrievalStrategy::ById { .. } => 1,
            RetrievalStrategy::ByShareLink { .. } => 2,
            RetrievalStrategy::ByLegacyUrl { .. } => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RetrievalStrategy::ById { .. } => "item-id",
            RetrievalStrategy::ByShareLink { .. } => "share-link",
            RetrievalStrategy::ByLegacyUrl { .. } => "legacy-url",
        }
    }

    /// Build the ordered strategy list for an identifier.
    ///
    /// Graph strategies are only planned when Graph access is configured;
    /// otherwise the legacy URL is the only usable path.
    pub fn plan(id: &DocumentIdentifier, graph_enabled: bool) -> Vec<RetrievalStrategy> {
        let mut strategies = Vec::with_capacity(3);

        if graph_enabled {
            if let Some(item_id) = id.item_id() {
                strategies.push(RetrievalStrategy::ById {
                    item_id: item_id.to_string(),
                });
            }
            if let Some(url) = id.legacy_url() {
                strategies.push(RetrievalStrategy::ByShareLink {
                    share_url: url.to_string(),
                    share_id: share_id(url),
                });
            }
        }

        if let Some(url) = id.legacy_url() {
            strategies.push(RetrievalStrategy::ByLegacyUrl {
                url: url.to_string(),
                candidates: candidate_download_urls(url),
            });
        }

        strategies.sort_by_key(RetrievalStrategy::priority);
        strategies
    }
}

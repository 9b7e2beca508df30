//! Upstream HTTP fetches for document bytes.
//!
//! One GET per call: optional bearer token, optional `Range` forwarded as-is,
//! redirects followed. Retrying and falling back are the resolver's job.
//!
//! Timeouts bound connecting and each wait for the next body chunk, not the
//! whole transfer, so a large document on a slow link still finishes.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt};
use orders_pdf_core::{
    content_range_start, validate, validate_continuation, FetchOutcome, PDF_SIGNATURE,
};
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument};

/// Upper bound on how much of an error body is kept for diagnostics.
const EXCERPT_LEN: usize = 512;

const USER_AGENT: &str = concat!("orders-pdf/", env!("CARGO_PKG_VERSION"));

/// Why a fetch produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// The upstream answered with a status of 400 or above.
    Status { code: u16, excerpt: String },
    /// Connection, TLS, timeout or redirect failure.
    Transport(String),
}

impl UpstreamFailure {
    pub fn into_outcome<D>(self) -> FetchOutcome<D> {
        match self {
            UpstreamFailure::Status { code, excerpt } => FetchOutcome::from_status(code, excerpt),
            UpstreamFailure::Transport(message) => FetchOutcome::UpstreamError {
                code: None,
                message,
            },
        }
    }
}

/// A response that passed PDF sniffing.
///
/// `prefix` holds the bytes consumed while sniffing; `rest` yields the
/// remainder of the body straight from the upstream connection. An
/// unsatisfiable range (416) carries no body at all.
pub struct FetchedDocument {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub prefix: Bytes,
    pub rest: BoxStream<'static, reqwest::Result<Bytes>>,
}

impl std::fmt::Debug for FetchedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedDocument")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("prefix_len", &self.prefix.len())
            .finish_non_exhaustive()
    }
}

/// Shared HTTP client for document hosts (stateless, token provided per call).
#[derive(Clone)]
pub struct UpstreamFetcher {
    http: Client,
}

impl UpstreamFetcher {
    /// Build a fetcher with a connect timeout and a per-read timeout.
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Underlying client, shared with the credential cache.
    pub fn client(&self) -> &Client {
        &self.http
    }

    /// GET `url`, returning the response for any status below 400.
    ///
    /// With a `range`, a 416 is returned as a response too.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn fetch(
        &self,
        url: &str,
        token: Option<&str>,
        range: Option<&str>,
    ) -> Result<Response, UpstreamFailure> {
        let mut req = self
            .http
            .get(url)
            .header(ACCEPT, "application/pdf,*/*");
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(range) = range {
            req = req.header(RANGE, range);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| UpstreamFailure::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE && range.is_some() {
            debug!("Upstream cannot satisfy range {:?} for {}", range, url);
            return Ok(resp);
        }
        if status.as_u16() >= 400 {
            let excerpt = body_excerpt(resp).await;
            debug!("Upstream returned {} for {}", status, url);
            return Err(UpstreamFailure::Status {
                code: status.as_u16(),
                excerpt,
            });
        }

        Ok(resp)
    }

    /// Fetch and sniff in one step, as every strategy does.
    pub async fn fetch_document(
        &self,
        url: &str,
        token: Option<&str>,
        range: Option<&str>,
    ) -> FetchOutcome<FetchedDocument> {
        match self.fetch(url, token, range).await {
            Ok(resp) => accept(resp, range.is_some()).await,
            Err(failure) => failure.into_outcome(),
        }
    }
}

/// Read just enough of the body to sniff it, then validate.
///
/// A 206 for a forwarded range that starts past byte 0 has no `%PDF`
/// signature, so it is judged by its declared type alone.
pub async fn accept(resp: Response, range_forwarded: bool) -> FetchOutcome<FetchedDocument> {
    let status = resp.status();
    let headers = resp.headers().clone();
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if range_forwarded && status == StatusCode::RANGE_NOT_SATISFIABLE {
        return FetchOutcome::Success(FetchedDocument {
            status,
            headers,
            prefix: Bytes::new(),
            rest: futures::stream::empty().boxed(),
        });
    }

    if range_forwarded && status == StatusCode::PARTIAL_CONTENT && starts_mid_file(&headers) {
        if let Err(failed) = validate_continuation(content_type.as_deref()) {
            return FetchOutcome::ValidationFailed(failed);
        }
        return FetchOutcome::Success(FetchedDocument {
            status,
            headers,
            prefix: Bytes::new(),
            rest: resp.bytes_stream().boxed(),
        });
    }

    let mut stream = resp.bytes_stream();
    let mut prefix = BytesMut::new();
    while prefix.len() < PDF_SIGNATURE.len() {
        match stream.next().await {
            Some(Ok(chunk)) => prefix.extend_from_slice(&chunk),
            Some(Err(e)) => {
                return FetchOutcome::UpstreamError {
                    code: None,
                    message: format!("Failed to read upstream body: {}", e),
                }
            }
            None => break,
        }
    }

    if let Err(failed) = validate(content_type.as_deref(), &prefix) {
        return FetchOutcome::ValidationFailed(failed);
    }

    FetchOutcome::Success(FetchedDocument {
        status,
        headers,
        prefix: prefix.freeze(),
        rest: stream.boxed(),
    })
}

fn starts_mid_file(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(content_range_start)
        .is_some_and(|start| start > 0)
}

async fn body_excerpt(mut resp: Response) -> String {
    let mut buf = Vec::new();
    while buf.len() < EXCERPT_LEN {
        match resp.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            _ => break,
        }
    }
    buf.truncate(EXCERPT_LEN);
    String::from_utf8_lossy(&buf).trim().to_string()
}

//! Turns a resolved upstream document into the outbound streaming response.

use std::io;

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use futures::stream::{self, StreamExt};
use orders_pdf_core::PDF_MIME;

use crate::error::{ProxyError, Result};
use crate::fetcher::FetchedDocument;

/// Upstream headers copied onto the outbound response when present.
const FORWARD_HEADERS: &[HeaderName] = &[header::CONTENT_DISPOSITION, header::CONTENT_LENGTH];

/// Build the outbound response.
///
/// The status is 206 only when the caller sent `Range` and the upstream
/// answered 206; anything else goes out as 200 without `Content-Range`.
/// An upstream 416 for the caller's range is passed on with its
/// `Content-Range: bytes */<size>` and an empty body.
/// Bodies longer than `max_bytes` are refused up front when the length is
/// declared, and cut off with a stream error otherwise.
pub fn respond(
    document: FetchedDocument,
    range_requested: bool,
    max_bytes: Option<u64>,
) -> Result<Response> {
    let FetchedDocument {
        status: upstream_status,
        headers: upstream_headers,
        prefix,
        rest,
    } = document;

    if range_requested && upstream_status == reqwest::StatusCode::RANGE_NOT_SATISFIABLE {
        return range_not_satisfiable(&upstream_headers);
    }

    if let Some(limit) = max_bytes {
        let declared = upstream_headers
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if let Some(size) = declared.filter(|size| *size > limit) {
            return Err(ProxyError::TooLarge { size, limit });
        }
    }

    let partial = range_requested && upstream_status == reqwest::StatusCode::PARTIAL_CONTENT;
    let status = if partial {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut sent: u64 = 0;
    let body = stream::once(futures::future::ready(Ok::<_, reqwest::Error>(prefix)))
        .chain(rest)
        .filter(|chunk| futures::future::ready(!matches!(chunk, Ok(b) if b.is_empty())))
        .map(move |chunk| {
            let chunk = chunk.map_err(io::Error::other)?;
            sent += chunk.len() as u64;
            match max_bytes {
                Some(limit) if sent > limit => Err(io::Error::other(format!(
                    "document exceeds the maximum size of {} bytes",
                    limit
                ))),
                _ => Ok(chunk),
            }
        });

    let mut response = Response::builder()
        .status(status)
        .body(Body::from_stream(body))
        .map_err(|e| ProxyError::Internal(format!("Failed to build response: {}", e)))?;

    let headers = response.headers_mut();
    for name in FORWARD_HEADERS {
        if let Some(value) = upstream_value(&upstream_headers, name) {
            headers.insert(name.clone(), value);
        }
    }
    if partial {
        if let Some(value) = upstream_value(&upstream_headers, &header::CONTENT_RANGE) {
            headers.insert(header::CONTENT_RANGE, value);
        }
    }

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PDF_MIME));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    Ok(response)
}

fn range_not_satisfiable(upstream_headers: &reqwest::header::HeaderMap) -> Result<Response> {
    let mut response = Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .body(Body::empty())
        .map_err(|e| ProxyError::Internal(format!("Failed to build response: {}", e)))?;

    let headers = response.headers_mut();
    if let Some(value) = upstream_value(upstream_headers, &header::CONTENT_RANGE) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    Ok(response)
}

fn upstream_value(headers: &reqwest::header::HeaderMap, name: &HeaderName) -> Option<HeaderValue> {
    headers
        .get(name.as_str())
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
}

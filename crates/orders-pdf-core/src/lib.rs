//! Core types and rules for the orders PDF retrieval proxy.
//!
//! This crate holds everything that does not touch the network:
//! - `AccessToken` / `TokenProvider`: bearer token and the seam the proxy fetches it through
//! - `DocumentIdentifier` / `RetrievalStrategy`: what the caller asked for and how to look for it
//! - `FetchOutcome`: the tagged result of one strategy attempt
//! - Share-id derivation, legacy download URL variants, `Content-Range` parsing and PDF sniffing

mod document;
mod legacy;
mod outcome;
mod range;
mod share;
mod token;
mod validate;

pub use document::{DocumentIdentifier, RetrievalStrategy};
pub use legacy::{candidate_download_urls, is_http_url};
pub use outcome::FetchOutcome;
pub use range::content_range_start;
pub use share::share_id;
pub use token::{
    AccessToken, CredentialError, TokenProvider, DEFAULT_TOKEN_LIFETIME_SECS, REFRESH_MARGIN_SECS,
};
pub use validate::{validate, validate_continuation, ValidationFailed, PDF_MIME, PDF_SIGNATURE};

//! Candidate URLs for legacy direct downloads.
//!
//! Some hosts only serve the inline viewer page unless a download
//! parameter is present, so the URL as given is followed by variants
//! that ask for the raw file.

const DOWNLOAD_PARAMS: &[&str] = &["download=1", "raw=1"];

/// Whether `url` has an `http://` or `https://` scheme (case-insensitive).
pub fn is_http_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// The given URL followed by its force-download variants, deduplicated in order.
pub fn candidate_download_urls(url: &str) -> Vec<String> {
    let mut candidates = vec![url.to_string()];

    for param in DOWNLOAD_PARAMS {
        if url.contains(param) {
            continue;
        }
        let sep = if url.contains('?') { '&' } else { '?' };
        candidates.push(format!("{}{}{}", url, sep, param));
    }

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.clone()));
    candidates
}

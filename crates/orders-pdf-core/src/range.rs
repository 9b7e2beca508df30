//! `Content-Range` parsing for partial responses.

/// First byte position of a `Content-Range: bytes <first>-<last>/<total>` value.
///
/// Unsatisfied ranges (`bytes */<total>`) and other units yield `None`.
pub fn content_range_start(value: &str) -> Option<u64> {
    let byte_range = value.trim().strip_prefix("bytes")?.trim_start();
    let (first, _) = byte_range.split_once('-')?;
    first.trim().parse().ok()
}

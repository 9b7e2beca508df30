//! Share-id derivation for the Graph `/shares/{id}` endpoint.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Encode a sharing URL as a Graph share id: `u!` followed by the unpadded
/// base64url encoding of the raw URL bytes.
pub fn share_id(share_url: &str) -> String {
    format!("u!{}", URL_SAFE_NO_PAD.encode(share_url.as_bytes()))
}

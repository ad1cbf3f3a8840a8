//! LINE webhook signature check: base64(HMAC-SHA256(channel secret, raw body)) in `x-line-signature`.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Header LINE puts the body signature in.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    MissingHeader,
    #[error("empty request body")]
    EmptyBody,
    #[error("signature mismatch")]
    Mismatch,
}

/// Base64-encoded HMAC-SHA256 of `body` keyed by `secret`.
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(body);
    B64.encode(mac.finalize().into_bytes())
}

/// Verify the claimed signature over the raw (unparsed) body. Byte-exact, case-sensitive,
/// constant-time once lengths match.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    let provided = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingHeader)?;
    if body.is_empty() {
        return Err(SignatureError::EmptyBody);
    }
    let expected = compute_signature(secret, body);
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() == expected.len() && bool::from(provided.ct_eq(expected)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

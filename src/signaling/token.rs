use sha2::{Digest, Sha256};

/// Short, non-reversible tag for a bearer token so logs can correlate joins
/// without ever holding the credential: first 8 bytes of SHA-256, hex.
#[must_use]
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

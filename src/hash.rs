//! Content fingerprinting.

use sha2::{Digest, Sha256};

/// SHA-256 of the UTF-8 bytes of `text`, as 64 lowercase hex characters.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

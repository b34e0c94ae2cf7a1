//! Shared-secret comparison for inbound webhooks and internal callers.

use sha2::{Digest, Sha256};

/// Check a presented secret against the configured one.
///
/// Fails closed: if no secret is configured, or the presented value is
/// missing or empty, the check fails. Both sides are hashed first so the
/// comparison runs over fixed-length digests regardless of input length.
pub fn secret_matches(presented: Option<&str>, configured: Option<&str>) -> bool {
    let (Some(presented), Some(configured)) = (presented, configured) else {
        return false;
    };
    if presented.is_empty() || configured.is_empty() {
        return false;
    }

    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(configured.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

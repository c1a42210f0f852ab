//! Code generation and identity redaction helpers.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a fixed-length numeric verification code.
///
/// Each digit is drawn independently and uniformly from 0-9, so leading
/// zeros are as likely as any other digit.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Short SHA-256 digest of an identity for log lines.
///
/// Raw addresses never appear in logs; log lines key on this instead.
pub fn identity_digest(identity: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..12].to_string()
}

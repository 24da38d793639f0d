//! Content-hash capability

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Fixed-length digest over arbitrary bytes, rendered as lowercase hex
pub trait ContentHasher: Send + Sync {
    fn digest(&self, data: &[u8]) -> String;

    /// Name of the algorithm, for logs
    fn algorithm(&self) -> &'static str;
}

/// SHA-1, the digest the client library signs authorization headers with
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Hasher;

impl ContentHasher for Sha1Hasher {
    fn digest(&self, data: &[u8]) -> String {
        hex::encode(Sha1::digest(data))
    }

    fn algorithm(&self) -> &'static str {
        "sha1"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn digest(&self, data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    fn algorithm(&self) -> &'static str {
        "sha256"
    }
}

//! # Digests
//!
//! SHA-256 over [`CanonicalBytes`]. Taking canonical bytes rather than a raw
//! slice means a digest can never be computed over an ad hoc encoding.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// Hash function behind a [`ContentDigest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-256, the only function in use.
    Sha256,
}

/// Hash output tagged with the function that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// Function that produced `bytes`.
    pub algorithm: DigestAlgorithm,
    /// Raw hash output.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Tag raw SHA-256 output.
    pub fn sha256(bytes: [u8; 32]) -> Self {
        ContentDigest {
            algorithm: DigestAlgorithm::Sha256,
            bytes,
        }
    }

    /// 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        use fmt::Write;
        self.bytes.iter().fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
    }
}

/// Renders as `Sha256:<hex>`.
impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.algorithm {
            DigestAlgorithm::Sha256 => "Sha256",
        };
        write!(f, "{tag}:{}", self.to_hex())
    }
}

/// Hash canonical bytes with SHA-256.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(Sha256::digest(data.as_bytes()).as_slice());
    ContentDigest::sha256(bytes)
}

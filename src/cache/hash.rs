//! Content fingerprints using blake3.

use std::fmt;

use super::INDEX_VERSION;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Convert to hex string (stored in the index).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 16 hex chars are enough for log lines
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Fingerprint of one diagram build input.
///
/// Covers the index format version, the job identity and the exact source
/// bytes. Fields are NUL-separated so `("a", "bc")` and `("ab", "c")` differ.
pub fn fingerprint(page_id: &str, name: &str, source: &str) -> ContentHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&INDEX_VERSION.to_le_bytes());
    hasher.update(page_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(name.as_bytes());
    hasher.update(&[0]);
    hasher.update(source.as_bytes());
    ContentHash::new(*hasher.finalize().as_bytes())
}

//! On-disk index of built diagrams.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::INDEX_VERSION;

/// Index file name (inside the tmp root)
pub const INDEX_FILE: &str = ".tikzpress-index.json";

/// A successfully built diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Hex blake3 fingerprint of the build input
    pub fingerprint: String,
    /// Artifact written by the converter
    pub artifact: PathBuf,
    /// Build completion time (Unix timestamp in seconds)
    #[serde(default)]
    pub built_at: u64,
}

impl IndexEntry {
    pub fn new(fingerprint: impl Into<String>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            artifact: artifact.into(),
            built_at: current_timestamp(),
        }
    }
}

/// Serialized form of the index: job key (`pageId/name`) -> entry.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CacheIndex {
    pub version: u32,
    #[serde(default)]
    pub entries: FxHashMap<String, IndexEntry>,
}

impl CacheIndex {
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            entries: FxHashMap::default(),
        }
    }
}

/// Read the index from `path`.
///
/// Returns `Ok(None)` when the file is missing or was written by a different
/// index version.
pub fn read_index(path: &Path) -> io::Result<Option<CacheIndex>> {
    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(path)?;
    let index: CacheIndex = serde_json::from_str(&json)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if index.version != INDEX_VERSION {
        return Ok(None);
    }
    Ok(Some(index))
}

/// Write the index to `path`. Returns `false` when the file already held
/// identical content and was left untouched.
pub fn write_index(path: &Path, index: &CacheIndex) -> io::Result<bool> {
    let json = serde_json::to_string_pretty(index)?;

    if file_content_matches(path, &json) {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(true)
}

/// Check if file content is the same as new content
fn file_content_matches(path: &Path, content: &str) -> bool {
    fs::read_to_string(path).is_ok_and(|existing| existing == content)
}

/// Get current Unix timestamp in seconds
fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

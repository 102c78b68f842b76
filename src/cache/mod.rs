//! Persistent cache of built diagrams.
//!
//! The index maps a job key (`pageId/name`) to the fingerprint of the source
//! that produced its artifact. It lives next to the intermediate files in the
//! tmp root, so clearing that directory clears the cache.

mod hash;
mod index;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

pub use hash::fingerprint;
pub use index::{CacheIndex, INDEX_FILE, IndexEntry};

/// Index format version. Bump when the fingerprint inputs change.
pub const INDEX_VERSION: u32 = 1;

/// In-memory view of the index, shared by concurrent renders.
#[derive(Debug)]
pub struct DiagramCache {
    path: PathBuf,
    entries: DashMap<String, IndexEntry>,
    dirty: AtomicBool,
}

impl DiagramCache {
    /// Load the index from `tmp_root`.
    ///
    /// A missing, outdated or unreadable index yields an empty cache; diagrams
    /// then fall back to comparing their intermediate source files.
    pub fn load(tmp_root: &Path) -> Self {
        let path = tmp_root.join(INDEX_FILE);
        let mut entries = DashMap::new();

        match index::read_index(&path) {
            Ok(Some(index)) => {
                crate::debug!("cache"; "restored {} entries", index.entries.len());
                entries.extend(index.entries);
            }
            Ok(None) => {}
            Err(e) => crate::debug!("cache"; "ignoring index {}: {}", path.display(), e),
        }

        Self {
            path,
            entries,
            dirty: AtomicBool::new(false),
        }
    }

    pub fn get(&self, key: &str) -> Option<IndexEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn record(&self, key: impl Into<String>, entry: IndexEntry) {
        self.entries.insert(key.into(), entry);
        self.dirty.store(true, Ordering::Release);
    }

    pub fn forget(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.dirty.store(true, Ordering::Release);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Write the index if anything changed since load.
    ///
    /// Returns whether the file was written.
    pub fn persist(&self) -> io::Result<bool> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }

        let mut index = CacheIndex::new();
        index.entries.extend(
            self.entries
                .iter()
                .map(|e| (e.key().clone(), e.value().clone())),
        );

        let written = index::write_index(&self.path, &index)?;
        crate::debug!("cache"; "saved {} entries to {}", index.entries.len(), self.path.display());
        Ok(written)
    }
}

/// Remove a cache or output directory. Returns whether anything was removed.
pub fn clear_dir(dir: &Path) -> io::Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(dir)?;
    Ok(true)
}

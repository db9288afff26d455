//! In-memory cache of served files.
//!
//! Layout:
//!
//! ```text
//! FileCache
//! +-- entries: RwLock<HashMap<PathBuf, CachedFile>>
//! |   +-- /site/index.html  -> { modified, content (script injected), text/html }
//! |   +-- /site/style.css   -> { modified, content, text/css }
//! +-- hits / misses         (atomic counters)
//! ```
//!
//! Reads take the shared lock; inserts take the exclusive lock for the
//! duration of a single map insert. Two requests missing on the same path at
//! the same time both read the file and the later insert wins, which is
//! harmless because the next lookup validates against the file's current
//! modification time again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use bytes::Bytes;

/// A cached file body with the modification time it was read at.
#[derive(Clone, Debug)]
pub struct CachedFile {
    modified: SystemTime,
    content: Bytes,
    content_type: &'static str,
}

impl CachedFile {
    /// Modification time of the file when it was read.
    #[must_use]
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Cached response body. Cloning is a reference count increment.
    #[must_use]
    pub fn content(&self) -> Bytes {
        self.content.clone()
    }

    /// Content type resolved when the file was cached.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }
}

/// Cache counters, for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that required reading the file.
    pub misses: u64,
    /// Number of cached paths.
    pub entries: usize,
}

/// Modification-time validated cache shared by all request handlers.
#[derive(Debug, Default)]
pub struct FileCache {
    entries: RwLock<HashMap<PathBuf, CachedFile>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FileCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `path`, returning the entry only if it was cached with exactly
    /// `modified` as its modification time.
    pub fn get(&self, path: &Path, modified: SystemTime) -> Option<CachedFile> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(path) {
            Some(entry) if entry.modified == modified => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            Some(_) => {
                tracing::debug!(path = %path.display(), "Cached file is stale");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `content` for `path`, replacing any previous entry.
    ///
    /// Returns the stored entry so callers can serve it directly.
    pub fn insert(
        &self,
        path: &Path,
        modified: SystemTime,
        content: impl Into<Bytes>,
        content_type: &'static str,
    ) -> CachedFile {
        let entry = CachedFile {
            modified,
            content: content.into(),
            content_type,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), entry.clone());
        entry
    }

    /// Current hit/miss counters and entry count.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }
}

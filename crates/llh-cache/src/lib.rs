//! Served file cache for livelocalhost.
//!
//! [`FileCache`] keeps the most recently served bytes of every file, keyed by
//! absolute path. An entry is valid only while the file's modification time
//! on disk equals the time stored with the entry, so a changed file is re-read
//! on the first request after the change and never served stale twice.
//!
//! The cache performs no I/O itself: callers stat the file, ask the cache for
//! an entry matching that modification time, and on a miss read the file and
//! [`FileCache::insert`] the (possibly transformed) bytes.
//!
//! Entries are never evicted. The set of keys is bounded by the files under
//! the served directory, which is acceptable for a development server.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use std::time::SystemTime;
//!
//! use llh_cache::FileCache;
//!
//! let cache = FileCache::new();
//! let path = Path::new("/site/index.html");
//! let modified = SystemTime::UNIX_EPOCH;
//!
//! assert!(cache.get(path, modified).is_none());
//! cache.insert(path, modified, "<html></html>", "text/html");
//! assert_eq!(cache.get(path, modified).unwrap().content(), "<html></html>");
//! ```

mod file;

pub use file::{CacheStats, CachedFile, FileCache};

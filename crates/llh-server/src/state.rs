//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;

use llh_cache::FileCache;

use crate::live_reload::LiveReloadManager;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Canonical directory being served.
    pub(crate) root_dir: PathBuf,
    /// Served file bodies, revalidated by modification time.
    pub(crate) cache: FileCache,
    /// Live reload manager (if enabled).
    pub(crate) live_reload: Option<LiveReloadManager>,
    /// Log every request with its status code.
    pub(crate) access_log: bool,
}

impl AppState {
    /// Script tag to inject into HTML pages, if live reload is enabled.
    #[must_use]
    pub(crate) fn script_tag(&self) -> Option<&str> {
        self.live_reload.as_ref().map(LiveReloadManager::script_tag)
    }
}

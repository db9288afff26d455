//! Live reload manager.
//!
//! Owns the file watcher, the debounce task, and the session hub, and holds
//! the generated client script served next to the event stream.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::debouncer::Debouncer;
use super::hub::{Session, SseHub};
use super::watcher;

/// Watcher events buffered before the notify thread blocks.
const MAILBOX_CAPACITY: usize = 100;

/// Coordinates file watching and event stream broadcasting.
pub(crate) struct LiveReloadManager {
    service: String,
    script_path: String,
    script: Bytes,
    script_tag: String,
    hub: Arc<SseHub>,
    quiet_period: Duration,
    access_log: bool,
    watcher: Option<RecommendedWatcher>,
}

impl LiveReloadManager {
    /// Create a new live reload manager.
    ///
    /// # Arguments
    ///
    /// * `service` - Route of the event stream (the client is at `<service>.js`)
    /// * `hotload_js` - Whether clients reload the page on script changes
    /// * `quiet_period` - Debounce period before a batch is broadcast
    /// * `access_log` - Log broadcasts alongside request logs
    #[must_use]
    pub(crate) fn new(
        service: &str,
        hotload_js: bool,
        quiet_period: Duration,
        access_log: bool,
    ) -> Self {
        let script_path = format!("{service}.js");
        let script_tag = llh_assets::script_tag(&script_path);
        let script = Bytes::from(llh_assets::client_script(service, hotload_js));

        Self {
            service: service.to_string(),
            script_path,
            script,
            script_tag,
            hub: Arc::new(SseHub::default()),
            quiet_period,
            access_log,
            watcher: None,
        }
    }

    /// Start watching `root`.
    ///
    /// Spawns the debounce task, which broadcasts each batch to all open
    /// sessions. Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the file watcher cannot be created.
    pub(crate) fn start(&mut self, root: &Path) -> Result<(), notify::Error> {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        self.watcher = Some(watcher::watch(root, tx)?);

        let hub = Arc::clone(&self.hub);
        let access_log = self.access_log;
        tokio::spawn(Debouncer::new(self.quiet_period).run(rx, move |batch| {
            let sessions = hub.broadcast(&batch);
            if access_log {
                tracing::info!(target: "access", "SSE file change ({sessions})");
            } else {
                tracing::debug!(paths = ?batch, sessions, "SSE file change");
            }
        }));

        Ok(())
    }

    pub(crate) fn service(&self) -> &str {
        &self.service
    }

    pub(crate) fn script_path(&self) -> &str {
        &self.script_path
    }

    /// Generated client script.
    pub(crate) fn script(&self) -> Bytes {
        self.script.clone()
    }

    /// `<script>` element injected into HTML pages.
    pub(crate) fn script_tag(&self) -> &str {
        &self.script_tag
    }

    pub(crate) fn subscribe(&self) -> Session {
        self.hub.subscribe()
    }

    pub(crate) fn session_count(&self) -> usize {
        self.hub.session_count()
    }

    /// End every open event stream.
    pub(crate) fn close_sessions(&self) {
        self.hub.close();
    }
}

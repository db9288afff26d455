//! Change debouncing for live reload.
//!
//! Collects changed paths until the watcher has been quiet for a full debounce
//! period, then hands the accumulated batch over in one piece. Editors emit
//! several events per save; browsers should see one notification.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc;

/// Pending changed paths, deduplicated, in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct ChangeSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl ChangeSet {
    /// Add a path. Returns `false` if it was already pending.
    pub fn insert(&mut self, path: String) -> bool {
        if !self.seen.insert(path.clone()) {
            return false;
        }
        self.order.push(path);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Take the pending paths, leaving the set empty.
    pub fn take(&mut self) -> Vec<String> {
        self.seen.clear();
        std::mem::take(&mut self.order)
    }
}

/// Trailing-edge debouncer.
///
/// Every received path restarts the quiet period. When it elapses without
/// new paths, the whole pending set is flushed as one batch.
pub(crate) struct Debouncer {
    quiet_period: Duration,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self { quiet_period }
    }

    /// Run until the sending side of `rx` is dropped.
    ///
    /// Paths still pending when the channel closes are flushed immediately.
    pub async fn run<F>(self, mut rx: mpsc::Receiver<Vec<String>>, mut flush: F)
    where
        F: FnMut(Vec<String>),
    {
        let mut pending = ChangeSet::default();

        loop {
            if pending.is_empty() {
                match rx.recv().await {
                    Some(paths) => pending_extend(&mut pending, paths),
                    None => break,
                }
                continue;
            }

            // Re-created on every message, which re-arms the quiet period
            let quiet = tokio::time::sleep(self.quiet_period);
            tokio::select! {
                received = rx.recv() => match received {
                    Some(paths) => pending_extend(&mut pending, paths),
                    None => break,
                },
                () = quiet => {
                    let batch = pending.take();
                    tracing::debug!(count = batch.len(), "Flushing change batch");
                    flush(batch);
                }
            }
        }

        if !pending.is_empty() {
            flush(pending.take());
        }
    }
}

fn pending_extend(pending: &mut ChangeSet, paths: Vec<String>) {
    for path in paths {
        if pending.insert(path.clone()) {
            tracing::trace!(path = %path, "Change recorded");
        }
    }
}

//! Registry of open event stream sessions.
//!
//! Each browser tab holds one [`Session`]. A change batch is serialized once
//! and fanned out to every registered session; sessions that went away are
//! pruned on the way.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::Stream;

/// Batches buffered per session before further batches are dropped for it.
const SESSION_BUFFER: usize = 16;

/// Broadcast hub for change batches.
#[derive(Debug, Default)]
pub(crate) struct SseHub {
    sessions: Mutex<HashMap<u64, mpsc::Sender<Arc<str>>>>,
    next_id: AtomicU64,
}

impl SseHub {
    /// Register a new session.
    pub fn subscribe(self: &Arc<Self>) -> Session {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.lock().insert(id, tx);
        tracing::debug!(session = id, "Live reload session opened");

        Session {
            id,
            rx,
            hub: Arc::clone(self),
        }
    }

    /// Send a batch of changed paths to every session.
    ///
    /// Returns the number of sessions the batch was queued for.
    pub fn broadcast(&self, changed: &[String]) -> usize {
        let payload: Arc<str> = match serde_json::to_string(changed) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize change batch");
                return 0;
            }
        };

        let targets: Vec<(u64, mpsc::Sender<Arc<str>>)> = self
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(Arc::clone(&payload)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(session = id, "Live reload session lagging, batch dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        if !closed.is_empty() {
            let mut sessions = self.lock();
            for id in closed {
                sessions.remove(&id);
            }
        }

        delivered
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    /// Drop every session's sender, ending all open streams.
    pub fn close(&self) {
        let mut sessions = self.lock();
        tracing::debug!(count = sessions.len(), "Closing live reload sessions");
        sessions.clear();
    }

    fn remove(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            tracing::debug!(session = id, "Live reload session closed");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::Sender<Arc<str>>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One subscriber's stream of serialized change batches.
///
/// Deregisters itself from the hub when dropped, which happens when the
/// client disconnects and axum drops the response body.
#[derive(Debug)]
pub(crate) struct Session {
    id: u64,
    rx: mpsc::Receiver<Arc<str>>,
    hub: Arc<SseHub>,
}

impl Stream for Session {
    type Item = Arc<str>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.hub.remove(self.id);
    }
}

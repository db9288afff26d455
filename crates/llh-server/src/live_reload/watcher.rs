//! Recursive file watcher feeding the debouncer.

use std::path::{Component, Path};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Watch `root` recursively and send the changed paths of every event,
/// relative to `root`, into `mailbox`.
///
/// The returned watcher stops when dropped.
///
/// # Errors
///
/// Returns an error if the platform watcher cannot be created or the
/// directory cannot be watched.
pub(crate) fn watch(
    root: &Path,
    mailbox: mpsc::Sender<Vec<String>>,
) -> Result<RecommendedWatcher, notify::Error> {
    let base = root.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        match res {
            Ok(event) => {
                let paths = changed_paths(&event, &base);
                if !paths.is_empty() {
                    // Callback runs on the notify thread, outside the runtime
                    let _ = mailbox.blocking_send(paths);
                }
            }
            Err(e) => tracing::debug!(error = %e, "File watcher error"),
        }
    })?;

    watcher.watch(root, RecursiveMode::Recursive)?;
    tracing::debug!(path = %root.display(), "Watching for changes");
    Ok(watcher)
}

/// Paths of a content-changing event, relative to `root` with `/` separators.
///
/// Access events, paths outside `root`, and `root` itself are skipped.
fn changed_paths(event: &Event, root: &Path) -> Vec<String> {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    ) {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter_map(|path| relative_path(path, root))
        .collect()
}

fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

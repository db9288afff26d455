//! Live reload over Server-Sent Events.
//!
//! The watcher reports changed paths, the debouncer groups them into batches,
//! and the hub pushes each batch as a `change` event to every open session.

mod debouncer;
mod hub;
mod manager;
mod sse;
mod watcher;

pub(crate) use manager::LiveReloadManager;
pub(crate) use sse::{script_handler, sse_handler};

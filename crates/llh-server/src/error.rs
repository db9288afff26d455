//! Server error types.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::static_files::text_response;

/// Per-request error, rendered as a plain-text status page.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// The request path failed normalization (traversal, encoded separators).
    #[error("Forbidden path: {0}")]
    Forbidden(String),
    /// The file does not exist, is not a regular file, or is unreadable.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Reading an existing file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Io { .. } => tracing::error!(error = %self, "Request failed"),
            _ => tracing::debug!(error = %self, "Request rejected"),
        }
        text_response(status, status.canonical_reason().unwrap_or_default())
    }
}

/// Error that prevents the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The directory to serve does not exist.
    #[error("server directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),
    /// The path to serve is not a directory.
    #[error("server path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),
    /// The live reload service path cannot be routed.
    #[error("invalid live reload service path: {0:?}")]
    InvalidReloadService(String),
    /// The file watcher could not be started.
    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        /// Directory that was to be watched.
        path: PathBuf,
        /// Underlying watcher error.
        source: notify::Error,
    },
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address as configured (`host:port`).
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

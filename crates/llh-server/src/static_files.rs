//! Static file serving.
//!
//! Resolves request paths inside the served directory, answers from the
//! [`FileCache`](llh_cache::FileCache) while a file's modification time is
//! unchanged, and injects the live reload script into HTML pages.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use llh_assets::{FALLBACK_MIME, is_html, mime_for};
use percent_encoding::percent_decode_str;

use crate::error::ServerError;
use crate::state::AppState;

/// Directory index served for directory requests.
const INDEX_FILE: &str = "index.html";

/// Closing head tag the script is inserted before.
const HEAD_CLOSE: &[u8] = b"</head>";

/// Create router for static file serving. Methods other than GET and HEAD
/// get 405.
pub(crate) fn static_router() -> Router<Arc<AppState>> {
    Router::new().fallback(get(serve_file))
}

/// Serve a file from the served directory.
async fn serve_file(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<Response, ServerError> {
    let raw = uri.path();
    let path = decode_request_path(raw).ok_or_else(|| ServerError::Forbidden(raw.to_string()))?;

    let (file_path, modified) = resolve_file(&state.root_dir, &path)
        .await
        .ok_or_else(|| ServerError::NotFound(path.clone()))?;

    if let Some(entry) = state.cache.get(&file_path, modified) {
        return Ok(file_response(entry.content_type(), entry.content()));
    }

    let content = tokio::fs::read(&file_path)
        .await
        .map_err(|source| read_error(&path, source))?;

    let name = file_path.to_string_lossy();
    let content = match state.script_tag() {
        Some(tag) if is_html(&name) => inject_script(content, tag),
        _ => content,
    };

    let entry = state
        .cache
        .insert(&file_path, modified, content, mime_for(&name));
    tracing::debug!(path = %path, bytes = entry.content().len(), "Cached file");

    Ok(file_response(entry.content_type(), entry.content()))
}

/// Classify a failed read: vanished or unreadable files are 404, anything
/// else is a server error.
fn read_error(path: &str, source: std::io::Error) -> ServerError {
    match source.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            ServerError::NotFound(path.to_owned())
        }
        _ => ServerError::Io {
            path: path.to_owned(),
            source,
        },
    }
}

/// Resolve a normalized request path to a regular file and its modification
/// time. Directories resolve to their `index.html`.
async fn resolve_file(root: &Path, path: &str) -> Option<(PathBuf, std::time::SystemTime)> {
    let mut file_path = root.join(path.trim_start_matches('/'));
    let mut metadata = tokio::fs::metadata(&file_path).await.ok()?;

    if metadata.is_dir() {
        file_path.push(INDEX_FILE);
        metadata = tokio::fs::metadata(&file_path).await.ok()?;
    }

    if !metadata.is_file() {
        return None;
    }

    let modified = metadata.modified().ok()?;
    Some((file_path, modified))
}

/// Percent-decode a request path and accept it only if it is already in
/// normal form.
///
/// Returns `None` for invalid UTF-8, backslashes, NUL bytes, and any path that
/// normalization would change (`..`, `.`, repeated slashes).
fn decode_request_path(raw: &str) -> Option<String> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    if decoded.contains(['\\', '\0']) {
        return None;
    }
    (normalize_path(&decoded) == decoded).then(|| decoded.into_owned())
}

/// Normalize an absolute URL path: collapse repeated slashes, drop `.`
/// segments, resolve `..` segments. A trailing slash is kept.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut normalized = format!("/{}", segments.join("/"));
    if path.ends_with('/') && !segments.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Insert `tag` before the first `</head>` (ASCII case-insensitive).
///
/// Pages without a head are returned unchanged.
fn inject_script(content: Vec<u8>, tag: &str) -> Vec<u8> {
    let Some(pos) = content
        .windows(HEAD_CLOSE.len())
        .position(|w| w.eq_ignore_ascii_case(HEAD_CLOSE))
    else {
        return content;
    };

    let mut injected = Vec::with_capacity(content.len() + tag.len());
    injected.extend_from_slice(&content[..pos]);
    injected.extend_from_slice(tag.as_bytes());
    injected.extend_from_slice(&content[pos..]);
    injected
}

/// Build a 200 response with an exact content length.
pub(crate) fn file_response(content_type: &'static str, body: Bytes) -> Response {
    body_response(StatusCode::OK, content_type, body)
}

/// Build a plain-text response, used for error pages.
pub(crate) fn text_response(status: StatusCode, text: &'static str) -> Response {
    body_response(status, FALLBACK_MIME, Bytes::from_static(text.as_bytes()))
}

fn body_response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_LENGTH, HeaderValue::from(body.len())),
        ],
        body,
    )
        .into_response()
}

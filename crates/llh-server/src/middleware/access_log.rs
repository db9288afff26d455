//! Access log middleware.
//!
//! Logs `<status> <path>` for every request under the `access` target:
//! successes at info, client errors at warn, server errors at error.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Log the request path with the response status.
pub(crate) async fn log_request(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let response = next.run(req).await;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        tracing::error!(target: "access", "{status} {path}");
    } else if response.status().is_client_error() {
        tracing::warn!(target: "access", "{status} {path}");
    } else {
        tracing::info!(target: "access", "{status} {path}");
    }

    response
}

//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn;
use axum::routing::get;
use tower::ServiceBuilder;

use crate::live_reload;
use crate::middleware::{access_log, headers};
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new();

    // Event stream and client script for live reload
    if let Some(ref manager) = state.live_reload {
        router = router
            .route(manager.service(), get(live_reload::sse_handler))
            .route(manager.script_path(), get(live_reload::script_handler));
    }

    // Everything else is a file under the served directory
    router = router.merge(static_files::static_router());

    let request_log = state.access_log.then(|| from_fn(access_log::log_request));
    router = router.layer(
        ServiceBuilder::new()
            .option_layer(request_log)
            .layer(headers::cache_control_layer()),
    );

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use llh_cache::FileCache;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use crate::live_reload::LiveReloadManager;

    /// Build state for a directory; live reload routes without a watcher.
    fn test_state(root: &Path, live_reload: bool) -> Arc<AppState> {
        Arc::new(AppState {
            root_dir: std::fs::canonicalize(root).unwrap(),
            cache: FileCache::new(),
            live_reload: live_reload.then(|| {
                LiveReloadManager::new(
                    "/livelocalhost.service",
                    false,
                    std::time::Duration::from_millis(600),
                    false,
                )
            }),
            access_log: false,
        })
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    fn site() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("index.html"),
            "<html><head></head><body>home</body></html>",
        )
        .unwrap();
        std::fs::write(tmp.path().join("style.css"), "body { color: red; }").unwrap();
        std::fs::create_dir(tmp.path().join("empty")).unwrap();
        std::fs::create_dir(tmp.path().join("docs")).unwrap();
        std::fs::write(
            tmp.path().join("docs/index.html"),
            "<html><head><title>Docs</title></head></html>",
        )
        .unwrap();
        tmp
    }

    #[tokio::test]
    async fn test_root_serves_index_with_single_injected_script() {
        let tmp = site();
        let state = test_state(tmp.path(), true);
        let router = create_router(state);

        let (status, headers, body) = get(&router, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/html");
        assert_eq!(
            body,
            "<html><head><script type=\"module\" src=\"/livelocalhost.service.js\"></script>\n</head><body>home</body></html>"
        );
        assert_eq!(body.matches("<script").count(), 1);
        assert_eq!(headers[header::CONTENT_LENGTH], body.len().to_string().as_str());
    }

    #[tokio::test]
    async fn test_no_injection_when_live_reload_disabled() {
        let tmp = site();
        let router = create_router(test_state(tmp.path(), false));

        let (status, _, body) = get(&router, "/index.html").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<html><head></head><body>home</body></html>");

        let (status, _, _) = get(&router, "/livelocalhost.service.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_nested_directory_serves_index() {
        let tmp = site();
        let router = create_router(test_state(tmp.path(), true));

        let (status, _, body) = get(&router, "/docs/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Docs</title><script type=\"module\""));
    }

    #[tokio::test]
    async fn test_static_file_headers() {
        let tmp = site();
        let router = create_router(test_state(tmp.path(), true));

        let (status, headers, body) = get(&router, "/style.css").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body { color: red; }");
        assert_eq!(headers[header::CONTENT_TYPE], "text/css");
        assert_eq!(headers[header::CACHE_CONTROL], "must-revalidate, max-age=0");
        assert_eq!(headers[header::CONTENT_LENGTH], "20");
    }

    #[tokio::test]
    async fn test_traversal_is_forbidden() {
        let tmp = site();
        let router = create_router(test_state(tmp.path(), true));

        let (status, headers, body) = get(&router, "/../secret").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, "Forbidden");
        assert_eq!(headers[header::CACHE_CONTROL], "must-revalidate, max-age=0");

        let (status, _, _) = get(&router, "/docs/../style.css").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = get(&router, "/%2e%2e/secret").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_directory_without_index_is_not_found() {
        let tmp = site();
        let router = create_router(test_state(tmp.path(), true));

        let (status, _, body) = get(&router, "/empty/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");

        let (status, _, _) = get(&router, "/empty").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let tmp = site();
        let router = create_router(test_state(tmp.path(), true));

        let (status, _, _) = get(&router, "/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = get(&router, "/style.css/child").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_extension_falls_back_to_plain_text() {
        let tmp = site();
        std::fs::write(tmp.path().join("notes.unknownext"), "hello").unwrap();
        let router = create_router(test_state(tmp.path(), true));

        let (status, headers, _) = get(&router, "/notes.unknownext").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    }

    #[tokio::test]
    async fn test_second_request_is_cache_hit() {
        let tmp = site();
        let state = test_state(tmp.path(), true);
        let router = create_router(Arc::clone(&state));

        let (_, _, first) = get(&router, "/").await;
        let (_, _, second) = get(&router, "/").await;

        assert_eq!(first, second);
        let stats = state.cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_modified_file_is_reread() {
        let tmp = site();
        let state = test_state(tmp.path(), true);
        let router = create_router(Arc::clone(&state));
        let css = tmp.path().join("style.css");

        let (_, _, before) = get(&router, "/style.css").await;
        assert_eq!(before, "body { color: red; }");

        std::fs::write(&css, "body { color: blue; }").unwrap();
        // Advance the timestamp explicitly: coarse filesystem clocks may not tick
        let later = std::fs::metadata(&css).unwrap().modified().unwrap()
            + std::time::Duration::from_secs(5);
        std::fs::File::options()
            .write(true)
            .open(&css)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let (_, _, after) = get(&router, "/style.css").await;
        assert_eq!(after, "body { color: blue; }");
        assert_eq!(state.cache.stats().misses, 2);
    }

    #[tokio::test]
    async fn test_access_log_layer_passes_responses_through() {
        let tmp = site();
        let mut state = Arc::into_inner(test_state(tmp.path(), false)).unwrap();
        state.access_log = true;
        let router = create_router(Arc::new(state));

        let (status, headers, _) = get(&router, "/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CACHE_CONTROL], "must-revalidate, max-age=0");

        let (status, _, _) = get(&router, "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_get_methods_are_rejected() {
        let tmp = site();
        let router = create_router(test_state(tmp.path(), true));

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/style.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "must-revalidate, max-age=0"
        );
    }

    #[tokio::test]
    async fn test_head_request_is_served() {
        let tmp = site();
        let router = create_router(test_state(tmp.path(), true));

        let response = router
            .oneshot(
                Request::builder()
                    .method("HEAD")
                    .uri("/style.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "20");
    }

    #[tokio::test]
    async fn test_read_failure_is_internal_error_with_standard_headers() {
        use crate::error::ServerError;

        let router: Router = Router::new()
            .fallback(|| async {
                ServerError::Io {
                    path: "/broken.css".to_owned(),
                    source: std::io::Error::other("device error"),
                }
            })
            .layer(headers::cache_control_layer());

        let (status, headers, body) = get(&router, "/broken.css").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error");
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(headers[header::CONTENT_LENGTH], "21");
        assert_eq!(headers[header::CACHE_CONTROL], "must-revalidate, max-age=0");
    }

    #[tokio::test]
    async fn test_script_route_serves_client() {
        let tmp = site();
        let router = create_router(test_state(tmp.path(), true));

        let (status, headers, body) = get(&router, "/livelocalhost.service.js").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/javascript");
        assert_eq!(headers[header::CACHE_CONTROL], "must-revalidate, max-age=0");
        assert!(body.contains(r#"const reloadService = "/livelocalhost.service";"#));
        assert!(body.contains("const hotloadJS = false;"));
    }
}

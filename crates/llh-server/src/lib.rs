//! Live reloading static file server for livelocalhost.
//!
//! This crate serves a directory over HTTP with axum and pushes change
//! notifications to open browser tabs:
//! - Static files, cached in memory and revalidated by modification time
//! - A reload script tag injected into every HTML page
//! - A Server-Sent Events endpoint broadcasting debounced file changes
//! - The generated browser client at `<service>.js`
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use llh_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         root_dir: PathBuf::from("build"),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (llh-server)
//!                        │
//!                        ├─► Static files ──► FileCache (llh-cache)
//!                        │       └─► <script> injected into HTML
//!                        │
//!                        ├─► <service>.js (generated client, llh-assets)
//!                        │
//!                        └─► <service> (SSE) ◄── SseHub ◄── Debouncer ◄── notify
//! ```

mod app;
mod error;
mod live_reload;
mod middleware;
mod state;
mod static_files;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use llh_cache::FileCache;

pub use error::StartupError;
pub use llh_cache::CacheStats;

use live_reload::LiveReloadManager;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory to serve.
    pub root_dir: PathBuf,
    /// Server-Sent Events endpoint (`None` disables live reload).
    pub reload_service: Option<String>,
    /// Reload pages when JavaScript files change.
    pub hotload_js: bool,
    /// Quiet period after the last file change before notifying browsers.
    pub debounce: Duration,
    /// Log every request with its status code.
    pub access_log: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            root_dir: PathBuf::from("."),
            reload_service: Some(llh_config::DEFAULT_RELOAD_SERVICE.to_string()),
            hotload_js: false,
            debounce: Duration::from_millis(600),
            access_log: false,
        }
    }
}

/// A configured server: shared state, running watcher, and router.
///
/// Must be created inside a tokio runtime because live reload spawns its
/// debounce task on construction.
pub struct Server {
    state: Arc<AppState>,
    router: Router,
    host: String,
    port: u16,
}

impl Server {
    /// Create the server and, if enabled, start watching the served directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist, the live reload
    /// service path is unusable, or the file watcher cannot be started.
    pub fn new(config: ServerConfig) -> Result<Self, StartupError> {
        let root_dir = std::fs::canonicalize(&config.root_dir)
            .map_err(|_| StartupError::RootNotFound(config.root_dir.clone()))?;
        if !root_dir.is_dir() {
            return Err(StartupError::RootNotDirectory(root_dir));
        }

        let live_reload = match config.reload_service.as_deref().filter(|s| !s.is_empty()) {
            Some(service) => {
                validate_service(service)?;
                let mut manager = LiveReloadManager::new(
                    service,
                    config.hotload_js,
                    config.debounce,
                    config.access_log,
                );
                manager
                    .start(&root_dir)
                    .map_err(|source| StartupError::Watch {
                        path: root_dir.clone(),
                        source,
                    })?;
                Some(manager)
            }
            None => None,
        };

        let state = Arc::new(AppState {
            root_dir,
            cache: FileCache::new(),
            live_reload,
            access_log: config.access_log,
        });
        let router = app::create_router(Arc::clone(&state));

        Ok(Self {
            state,
            router,
            host: config.host,
            port: config.port,
        })
    }

    /// The application router, for serving or for driving requests in tests.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Canonical path of the served directory.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.state.root_dir
    }

    /// File cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.state.cache.stats()
    }

    /// Number of open live reload sessions (0 when live reload is disabled).
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.state
            .live_reload
            .as_ref()
            .map_or(0, LiveReloadManager::session_count)
    }

    /// Bind the configured address and serve until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn serve(self) -> Result<(), StartupError> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|source| StartupError::Bind {
                addr: addr.clone(),
                source,
            })?;
        tracing::info!(address = %addr, root = %self.state.root_dir.display(), "Starting server");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(self.state))
            .await
            .map_err(StartupError::Serve)?;

        Ok(())
    }
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), StartupError> {
    Server::new(config)?.serve().await
}

/// Create server configuration from livelocalhost config.
#[must_use]
pub fn server_config_from_config(config: &llh_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        root_dir: config.root_dir.clone(),
        reload_service: config.live_reload.service().map(str::to_string),
        hotload_js: config.live_reload.hotload_js,
        debounce: Duration::from_millis(config.live_reload.debounce_ms),
        access_log: config.server.access_log,
    }
}

/// Reject service paths the router cannot mount.
fn validate_service(service: &str) -> Result<(), StartupError> {
    if !service.starts_with('/') || service == "/" || service.contains(['{', '}', '*']) {
        return Err(StartupError::InvalidReloadService(service.to_string()));
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl-C), then end open event streams so the
/// graceful shutdown does not wait on them forever.
async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
    if let Some(live_reload) = &state.live_reload {
        live_reload.close_sessions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(
            config.reload_service.as_deref(),
            Some("/livelocalhost.service")
        );
        assert_eq!(config.debounce, Duration::from_millis(600));
        assert!(!config.hotload_js);
        assert!(!config.access_log);
    }

    #[test]
    fn test_server_config_from_config() {
        let mut config = llh_config::Config::default();
        config.server.port = 9000;
        config.live_reload.service = String::new();
        config.live_reload.debounce_ms = 250;

        let server_config = server_config_from_config(&config);

        assert_eq!(server_config.port, 9000);
        assert_eq!(server_config.reload_service, None);
        assert_eq!(server_config.debounce, Duration::from_millis(250));
    }

    #[test]
    fn test_validate_service() {
        assert!(validate_service("/livelocalhost.service").is_ok());
        assert!(validate_service("/nested/reload").is_ok());
        assert!(validate_service("reload").is_err());
        assert!(validate_service("/").is_err());
        assert!(validate_service("/{*rest}").is_err());
    }

    #[test]
    fn test_missing_root_fails_fast() {
        let config = ServerConfig {
            root_dir: PathBuf::from("/nonexistent/llh/root"),
            reload_service: None,
            ..ServerConfig::default()
        };

        let err = Server::new(config).err().unwrap();
        assert!(matches!(err, StartupError::RootNotFound(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_root_must_be_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("index.html");
        std::fs::write(&file, "<html></html>").unwrap();

        let config = ServerConfig {
            root_dir: file,
            reload_service: None,
            ..ServerConfig::default()
        };

        let err = Server::new(config).err().unwrap();
        assert!(matches!(err, StartupError::RootNotDirectory(_)));
    }

    #[test]
    fn test_disabled_live_reload_has_no_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            root_dir: tmp.path().to_path_buf(),
            reload_service: Some(String::new()),
            ..ServerConfig::default()
        };

        let server = Server::new(config).unwrap();
        assert_eq!(server.session_count(), 0);
        assert_eq!(server.root_dir(), std::fs::canonicalize(tmp.path()).unwrap());
    }
}

//! Configuration management for livelocalhost.
//!
//! Parses `livelocalhost.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every setting has a
//! default, so running without a config file is the common case.
//!
//! CLI settings (flags and their environment variables) are applied during
//! load via [`CliSettings`] and take precedence over file values.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `server.root` (also expands a leading `~`)
//! - `live_reload.service`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override the directory to serve.
    pub root_dir: Option<PathBuf>,
    /// Override the live reload service path (empty disables live reload).
    pub reload_service: Option<String>,
    /// Override JavaScript hot reloading.
    pub hotload_js: Option<bool>,
    /// Override the watch debounce in milliseconds.
    pub debounce_ms: Option<u64>,
    /// Override access logging.
    pub access_log: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "livelocalhost.toml";

/// Default live reload service path.
pub const DEFAULT_RELOAD_SERVICE: &str = "/livelocalhost.service";

/// Upper bound for the watch debounce.
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,

    /// Resolved absolute directory to serve (set after loading).
    #[serde(skip)]
    pub root_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Log every request with its status code.
    pub access_log: bool,
    /// Directory to serve, relative to the config file (resolved into
    /// [`Config::root_dir`]).
    root: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            access_log: false,
            root: None,
        }
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Path of the Server-Sent Events endpoint. Empty disables live reload.
    pub service: String,
    /// Reload the page when JavaScript files change.
    pub hotload_js: bool,
    /// Quiet period after the last file change before notifying browsers.
    pub debounce_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            service: DEFAULT_RELOAD_SERVICE.to_owned(),
            hotload_js: false,
            debounce_ms: 600,
        }
    }
}

impl LiveReloadConfig {
    /// The live reload service path, or `None` when live reload is disabled.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        (!self.service.is_empty()).then_some(self.service.as_str())
    }

    /// Whether live reload is enabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.service().is_some()
    }

    /// Path of the generated client script (`<service>.js`).
    #[must_use]
    pub fn script_path(&self) -> Option<String> {
        self.service().map(|s| format!("{s}.js"))
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`SERVE_HOST`} environment variable not found").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Normalize a reload service path to an absolute URL path.
///
/// `./reload` and `reload` become `/reload`. Empty stays empty (disabled).
fn normalize_service(service: &str) -> String {
    let trimmed = service.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let stripped = trimmed.trim_start_matches("./").trim_start_matches('/');
    format!("/{stripped}")
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `livelocalhost.toml` in current directory and
    /// parents, falling back to defaults rooted at the current directory.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged result
    /// is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.live_reload.service = normalize_service(&config.live_reload.service);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(root_dir) = &settings.root_dir {
            self.root_dir.clone_from(root_dir);
        }
        if let Some(service) = &settings.reload_service {
            self.live_reload.service.clone_from(service);
        }
        if let Some(hotload_js) = settings.hotload_js {
            self.live_reload.hotload_js = hotload_js;
        }
        if let Some(debounce_ms) = settings.debounce_ms {
            self.live_reload.debounce_ms = debounce_ms;
        }
        if let Some(access_log) = settings.access_log {
            self.server.access_log = access_log;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config serving the current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config serving the given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            live_reload: LiveReloadConfig::default(),
            root_dir: base.to_path_buf(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_live_reload()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate live reload configuration.
    fn validate_live_reload(&self) -> Result<(), ConfigError> {
        let Some(service) = self.live_reload.service() else {
            return Ok(());
        };

        if service == "/" {
            return Err(ConfigError::Validation(
                "live_reload.service cannot be the site root".to_owned(),
            ));
        }
        if service.contains(['{', '}', '*']) {
            return Err(ConfigError::Validation(format!(
                "live_reload.service contains invalid characters: {service}"
            )));
        }
        if self.live_reload.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "live_reload.debounce_ms cannot exceed {MAX_DEBOUNCE_MS}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref root) = self.server.root {
            self.server.root = Some(expand::expand_path(root, "server.root")?);
        }

        self.live_reload.service =
            expand::expand_env(&self.live_reload.service, "live_reload.service")?;

        Ok(())
    }

    /// Resolve the served directory against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.root_dir = config_dir.join(self.server.root.as_deref().unwrap_or("."));
    }
}

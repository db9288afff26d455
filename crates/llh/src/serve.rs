//! Serve command implementation.

use std::convert::Infallible;
use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, Args};
use llh_config::{CliSettings, Config};
use llh_server::{Server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for serving a directory.
#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// HTTP port (same as --serveport).
    #[arg(value_name = "PORT")]
    port: Option<u16>,

    /// Directory to serve (same as --servedir).
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Load environment variables from a .env file.
    #[arg(short, long, value_name = "FILE")]
    env: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover livelocalhost.toml).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP port [default: 8000].
    #[arg(short = 'p', long, env = "SERVE_PORT")]
    serveport: Option<u16>,

    /// Directory to serve [default: ./].
    #[arg(short = 'd', long, env = "BUILD_DIR")]
    servedir: Option<PathBuf>,

    /// Path of the live reload service, empty to disable [default: /livelocalhost.service].
    #[arg(short = 'r', long, env = "RELOAD_SERVICE")]
    reloadservice: Option<String>,

    /// Reload pages when JavaScript files change.
    #[arg(short = 'j', long, env = "HOTLOAD_JS", action = ArgAction::SetTrue, value_parser = parse_switch)]
    hotload_js: bool,

    /// Milliseconds to wait after the last change before notifying browsers [default: 600].
    #[arg(short = 'w', long, env = "WATCH_DEBOUNCE")]
    watch_debounce: Option<u64>,

    /// Show the server access log.
    #[arg(short = 'l', long, env = "ACCESS_LOG", action = ArgAction::SetTrue, value_parser = parse_switch)]
    access_log: bool,

    /// Host to bind to [default: 127.0.0.1].
    #[arg(long)]
    host: Option<String>,

    /// Enable verbose output.
    #[arg(long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Let positional port and directory win over values taken from the
    /// environment. Explicit flags still win over positionals.
    pub(crate) fn prefer_positionals(&mut self, matches: &ArgMatches) {
        let from_env = |id: &str| matches.value_source(id) == Some(ValueSource::EnvVariable);

        if self.port.is_some() && (self.serveport.is_none() || from_env("serveport")) {
            self.serveport = self.port;
        }
        if self.dir.is_some() && (self.servedir.is_none() || from_env("servedir")) {
            self.servedir.clone_from(&self.dir);
        }
    }

    /// Overrides applied on top of the configuration file.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.serveport,
            root_dir: self.servedir.clone(),
            reload_service: self.reloadservice.clone(),
            hotload_js: self.hotload_js.then_some(true),
            debounce_ms: self.watch_debounce,
            access_log: self.access_log.then_some(true),
        }
    }

    /// Load the configuration, print the startup summary, and serve until
    /// Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        tracing::info!(
            config = ?config.config_path,
            root = %config.root_dir.display(),
            "Configuration loaded"
        );
        let server = Server::new(server_config_from_config(&config))?;

        output.highlight(&format!("LiveLocalhost {}", env!("CARGO_PKG_VERSION")));
        output.status(
            "server",
            &format!("http://{}:{}/", config.server.host, config.server.port),
        );
        output.status("directory", &server.root_dir().display().to_string());
        if let Some(path) = &config.config_path {
            output.status("config", &path.display().to_string());
        }
        if let Some(path) = &self.env {
            output.status("env file", &path.display().to_string());
        }
        match (config.live_reload.service(), config.live_reload.script_path()) {
            (Some(service), Some(script)) => {
                output.status("reload service", service);
                output.status("reload script", &script);
                output.status("JS hot reload", on_off(config.live_reload.hotload_js));
            }
            _ => output.status("live reload", "off"),
        }
        output.status("access log", on_off(config.server.access_log));

        server.serve().await?;
        tracing::info!("Server stopped");

        Ok(())
    }
}

/// Switch value from the environment: only `true` (any case) turns it on.
/// Anything else, including an empty value, leaves it off.
fn parse_switch(value: &str) -> Result<bool, Infallible> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

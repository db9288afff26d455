//! CLI error types.

use std::path::PathBuf;

use llh_config::ConfigError;
use llh_server::StartupError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Server(#[from] StartupError),

    #[error("failed to load environment file {}: {source}", path.display())]
    Env {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

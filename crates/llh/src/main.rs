//! LiveLocalhost CLI.
//!
//! Serves a local directory over HTTP and reloads open browser tabs when
//! files change:
//!
//! ```text
//! llh [PORT] [DIR] [OPTIONS]
//! ```

mod error;
mod output;
mod serve;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, CommandFactory, FromArgMatches, Parser};
use tracing_subscriber::EnvFilter;

use error::CliError;
use output::Output;
use serve::ServeArgs;

/// Filter used when `RUST_LOG` is not set: warnings plus the access log.
const DEFAULT_FILTER: &str = "warn,access=info";

/// LiveLocalhost - development server with live reload.
#[derive(Parser)]
#[command(name = "llh", version, about, disable_version_flag = true)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,

    /// Show the environment variables that set options.
    #[arg(short = 'E', long)]
    helpenv: bool,
}

/// Command definition with `-v` for the version.
fn command() -> Command {
    Cli::command().arg(
        Arg::new("version")
            .short('v')
            .long("version")
            .action(ArgAction::Version)
            .help("Print version"),
    )
}

/// `NAME  description` lines for every option that reads the environment.
fn env_help(command: &Command) -> Vec<String> {
    command
        .get_arguments()
        .filter_map(|arg| {
            let name = arg.get_env()?.to_string_lossy();
            let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
            Some(format!("{name:<16} {help}"))
        })
        .collect()
}

fn main() {
    let output = Output::new();

    // Environment variables feed argument parsing, so the .env file is loaded first
    if let Err(err) = load_env_file(std::env::args_os()) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }

    let matches = command().get_matches();
    let mut cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };
    if cli.helpenv {
        output.highlight("Options read from the environment (or a file loaded with --env):");
        for line in env_help(&command()) {
            output.info(&line);
        }
        output.info("Command line arguments take precedence over environment variables.");
        return;
    }
    cli.serve.prefer_positionals(&matches);

    // --verbose enables INFO level, otherwise use RUST_LOG or the default filter
    let filter = if cli.serve.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = tokio::runtime::Runtime::new()
        .map_err(CliError::from)
        .and_then(|rt| rt.block_on(cli.serve.execute()));

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// Load the file named by `-e`/`--env`, if any. Variables already set in the
/// environment are kept.
fn load_env_file(args: impl IntoIterator<Item = OsString>) -> Result<(), CliError> {
    let Some(path) = env_file_arg(args) else {
        return Ok(());
    };
    dotenvy::from_path(&path).map_err(|source| CliError::Env { path, source })
}

/// Find the value of `-e`/`--env` before full argument parsing.
fn env_file_arg(args: impl IntoIterator<Item = OsString>) -> Option<PathBuf> {
    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        let Some(arg) = arg.to_str() else {
            continue;
        };
        match arg {
            "--" => return None,
            "-e" | "--env" => return args.next().map(PathBuf::from),
            _ => {
                if let Some(value) = arg.strip_prefix("--env=") {
                    return Some(PathBuf::from(value));
                }
                if let Some(value) = arg.strip_prefix("-e").filter(|v| !v.is_empty()) {
                    return Some(PathBuf::from(value.strip_prefix('=').unwrap_or(value)));
                }
            }
        }
    }
    None
}

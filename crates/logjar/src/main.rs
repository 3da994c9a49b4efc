//! LogJar - record and query application error logs
//!
//! # Usage
//!
//! ```bash
//! # Record an entry in today's file
//! logjar write "disk full"
//! logjar write --severity warning "cache cold" --config logjar.toml
//!
//! # Print entries back
//! logjar read                              # files created today
//! logjar read --date 2024-05-01
//! logjar read --from 2024-05-01 --to 2024-05-07 --format json
//! logjar read --name log_20240501.json
//! ```

mod cmd;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logjar_config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// LogJar - record and query application error logs
#[derive(Parser, Debug)]
#[command(name = "logjar")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record one entry and wait until it is on disk
    Write(cmd::write::WriteArgs),

    /// Print stored entries
    Read(cmd::read::ReadArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let log_level = resolve_log_level(cli.log_level.as_deref(), &config);
    init_logging(&log_level, config.log.format)?;

    match cli.command {
        Command::Write(args) => cmd::write::run(args, config.sink).await,
        Command::Read(args) => cmd::read::run(args, config.sink).await,
    }
}

/// Load the config file if one was given, defaults otherwise
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, config: &Config) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => config.log.level.as_str().to_string(),
    }
}

/// Initialize the tracing subscriber for logging
///
/// Diagnostics go to stderr so `read` output can be piped.
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    match format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(layer.compact())
            .with(filter)
            .init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "logjar",
            "write",
            "disk full",
            "--config",
            "logjar.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::Write(_)));
        assert_eq!(cli.config.as_deref(), Some(Path::new("logjar.toml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_log_level_precedence() {
        let config: Config = "[log]\nlevel = \"warn\"".parse().unwrap();
        assert_eq!(resolve_log_level(Some("trace"), &config), "trace");
        assert_eq!(resolve_log_level(None, &config), "warn");
        assert_eq!(resolve_log_level(None, &Config::default()), "info");
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let result = load_config(Some(Path::new("/nonexistent/logjar.toml")));
        assert!(result.is_err());
    }
}

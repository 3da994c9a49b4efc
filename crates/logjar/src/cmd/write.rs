//! Write command - record one entry
//!
//! # Usage
//!
//! ```bash
//! logjar write "disk full"
//! logjar write --severity warning "cache cold"
//! logjar write --directory /tmp/logs "disk full"
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use logjar_config::SinkConfig;
use logjar_sink::{DestinationResolver, LogJar, Severity};

/// Write command arguments
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Message to record
    #[arg(value_name = "MESSAGE")]
    message: String,

    /// Entry severity (error, warning)
    #[arg(short, long, default_value = "error")]
    severity: Severity,

    /// Directory to write to (overrides config)
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Indent the JSON written (overrides config)
    #[arg(long)]
    pretty: bool,
}

/// Run the write command
pub async fn run(args: WriteArgs, mut config: SinkConfig) -> Result<()> {
    if let Some(directory) = args.directory {
        config.directory = directory;
    }
    config.pretty |= args.pretty;

    let destination = DestinationResolver::new(config.file_name.clone())
        .resolve()
        .context("failed to resolve destination file")?;
    let path = config.directory.join(&destination);

    let jar = LogJar::new(config).context("failed to start log sink")?;
    jar.write_message(args.severity, args.message)?;
    jar.shutdown().await;

    let metrics = jar.metrics();
    if metrics.write_errors > 0 || metrics.entries_dropped > 0 {
        bail!("entry was not written to {}", path.display());
    }

    println!("{} entry written to {}", args.severity, path.display());
    Ok(())
}

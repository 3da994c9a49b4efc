//! Read command - print stored entries
//!
//! Outputs one line per entry (text) or the matched files as JSON.
//!
//! # Usage
//!
//! ```bash
//! logjar read                                  # files created today
//! logjar read --date 2024-05-01
//! logjar read --from 2024-05-01 --to 2024-05-07
//! logjar read --name log_20240501.json --format json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use logjar_config::SinkConfig;
use logjar_sink::{LogEntry, LogFiles, LogReader};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per entry
    #[default]
    Text,
    /// Files and their entries as a JSON array
    Json,
}

/// Read command arguments
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Files created on this day (YYYY-MM-DD). Default: today
    #[arg(long, conflicts_with_all = ["from", "to", "name"])]
    date: Option<NaiveDate>,

    /// Start of a creation date range, inclusive
    #[arg(long, requires = "to", conflicts_with = "name")]
    from: Option<NaiveDate>,

    /// End of a creation date range, inclusive
    #[arg(long, requires = "from", conflicts_with = "name")]
    to: Option<NaiveDate>,

    /// Exact file name
    #[arg(long)]
    name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Directory to read from (overrides config)
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Which files to read
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    Date(NaiveDate),
    Range(NaiveDate, NaiveDate),
    Name(String),
}

impl ReadArgs {
    fn selection(&self) -> Selection {
        if let Some(name) = &self.name {
            return Selection::Name(name.clone());
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            return Selection::Range(from, to);
        }
        Selection::Date(self.date.unwrap_or_else(|| Local::now().date_naive()))
    }
}

/// Run the read command
pub async fn run(args: ReadArgs, config: SinkConfig) -> Result<()> {
    let reader = match &args.directory {
        Some(directory) => LogReader::new(directory.clone()),
        None => LogReader::from_config(&config),
    };

    let selection = args.selection();
    let files = match &selection {
        Selection::Date(date) => reader.by_date(*date),
        Selection::Range(from, to) => reader.by_range(*from, *to),
        Selection::Name(name) => reader.by_name(name),
    }
    .with_context(|| format!("failed to read {}", reader.directory().display()))?;

    tracing::debug!(selection = ?selection, files = files.len(), "files matched");

    let mut out = io::stdout().lock();
    match args.format {
        OutputFormat::Text => write_text(&mut out, &files)?,
        OutputFormat::Json => write_json(&mut out, &files)?,
    }
    out.flush()?;

    Ok(())
}

fn write_text(out: &mut impl Write, files: &LogFiles) -> Result<()> {
    for (file, entries) in files {
        writeln!(out, "==> {} ({} entries) <==", file.name, entries.len())?;
        for entry in entries {
            writeln!(out, "{}", format_entry(entry))?;
        }
    }
    Ok(())
}

/// One matched file in JSON output
#[derive(Debug, Serialize)]
struct FileOutput<'a> {
    file: &'a str,
    /// Lossy for non-UTF-8 paths
    path: String,
    created: String,
    size: u64,
    entries: &'a [LogEntry],
}

fn write_json(out: &mut impl Write, files: &LogFiles) -> Result<()> {
    let value: Vec<FileOutput<'_>> = files
        .iter()
        .map(|(file, entries)| FileOutput {
            file: &file.name,
            path: file.path.display().to_string(),
            created: file.created.to_rfc3339(),
            size: file.size,
            entries,
        })
        .collect();

    serde_json::to_writer_pretty(&mut *out, &value)?;
    writeln!(out)?;
    Ok(())
}

/// Format an entry for human-readable output
fn format_entry(entry: &LogEntry) -> String {
    let ts = entry
        .timestamp()
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S%.3f");
    let severity = format!("{:7}", entry.severity().as_str());

    let mut line = format!("{} {} {}", ts, severity, entry.message());
    if let Some(site) = entry.target_site() {
        line.push_str(&format!(" [{}]", site));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use logjar_sink::Severity;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ReadArgs,
    }

    fn parse(args: &[&str]) -> std::result::Result<ReadArgs, clap::Error> {
        let argv = std::iter::once("read").chain(args.iter().copied());
        Harness::try_parse_from(argv).map(|h| h.args)
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_selection_is_today() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.selection(), Selection::Date(Local::now().date_naive()));
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_range_selection() {
        let args = parse(&["--from", "2024-05-01", "--to", "2024-05-07"]).unwrap();
        assert_eq!(
            args.selection(),
            Selection::Range(date("2024-05-01"), date("2024-05-07"))
        );
    }

    #[test]
    fn test_range_requires_both_ends() {
        assert!(parse(&["--from", "2024-05-01"]).is_err());
    }

    #[test]
    fn test_date_conflicts_with_name() {
        assert!(parse(&["--date", "2024-05-01", "--name", "a.json"]).is_err());
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(parse(&["--date", "05/01/2024"]).is_err());
    }

    #[test]
    fn test_format_entry() {
        let entry = LogEntry::new(Severity::Warning, "cache cold").unwrap();
        let line = format_entry(&entry);
        assert!(line.contains("Warning cache cold"), "{line}");
    }

    #[test]
    fn test_text_output_has_file_header() {
        let temp = tempfile::TempDir::new().unwrap();
        let entries = vec![LogEntry::new(Severity::Error, "disk full").unwrap()];
        logjar_sink::append_batch(temp.path(), "log.json", &entries, &Default::default()).unwrap();

        let files = LogReader::new(temp.path()).by_name("log.json").unwrap();
        let mut out = Vec::new();
        write_text(&mut out, &files).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("==> log.json (1 entries) <=="));
        assert!(text.contains("disk full"));
    }

    #[test]
    fn test_json_output() {
        let temp = tempfile::TempDir::new().unwrap();
        let entries = vec![LogEntry::new(Severity::Error, "disk full").unwrap()];
        logjar_sink::append_batch(temp.path(), "log.json", &entries, &Default::default()).unwrap();

        let files = LogReader::new(temp.path()).by_name("log.json").unwrap();
        let mut out = Vec::new();
        write_json(&mut out, &files).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["file"], "log.json");
        assert_eq!(value[0]["entries"][0]["Message"], "disk full");
    }

    #[cfg(unix)]
    #[test]
    fn test_json_output_non_utf8_file_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = tempfile::TempDir::new().unwrap();
        let name = OsStr::from_bytes(b"log_\xff.json");
        let entries = vec![LogEntry::new(Severity::Error, "odd name").unwrap()];
        let bytes = serde_json::to_vec(&entries).unwrap();
        if std::fs::write(temp.path().join(name), bytes).is_err() {
            // Filesystem refuses non-UTF-8 names
            return;
        }

        let files = LogReader::new(temp.path())
            .by_date(Local::now().date_naive())
            .unwrap();
        assert_eq!(files.len(), 1);

        let mut out = Vec::new();
        write_json(&mut out, &files).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(value[0]["path"].as_str().unwrap().ends_with(".json"));
        assert_eq!(value[0]["entries"][0]["Message"], "odd name");
    }
}

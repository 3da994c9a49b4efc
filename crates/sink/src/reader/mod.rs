//! Reader - query persisted entries back from the log directory
//!
//! Files are selected by creation date or by exact name, then read and
//! parsed in full. Both layouts are accepted; the first significant byte
//! decides (`[` for a JSON array, anything else for JSON Lines).
//!
//! Files that cannot be read or parsed are skipped with a warning so one
//! damaged file does not hide the rest of the directory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use logjar_config::SinkConfig;

use crate::common::{Result, SinkError};
use crate::entry::LogEntry;

/// Entries grouped by file, ordered by creation time then name
pub type LogFiles = BTreeMap<LogFileInfo, Vec<LogEntry>>;

/// A log file found in the directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogFileInfo {
    /// Creation time, or modification time where birth time is unavailable
    pub created: DateTime<Local>,
    pub name: String,
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

impl LogFileInfo {
    fn from_path(path: PathBuf) -> io::Result<Self> {
        let metadata = fs::metadata(&path)?;
        let created = metadata.created().or_else(|_| metadata.modified())?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            created: DateTime::<Local>::from(created),
            name,
            path,
            size: metadata.len(),
        })
    }

    /// Local calendar date the file was created on
    pub fn created_date(&self) -> NaiveDate {
        self.created.date_naive()
    }
}

/// Read-side access to a log directory
#[derive(Debug, Clone)]
pub struct LogReader {
    directory: PathBuf,
}

impl LogReader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Reader over the directory a sink with `config` writes to
    pub fn from_config(config: &SinkConfig) -> Self {
        Self::new(config.directory.clone())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Files created on `date` (local time)
    pub fn by_date(&self, date: NaiveDate) -> Result<LogFiles> {
        self.collect(|info| info.created_date() == date)
    }

    /// Files created between `from` and `to`, both inclusive
    pub fn by_range(&self, from: NaiveDate, to: NaiveDate) -> Result<LogFiles> {
        self.collect(|info| (from..=to).contains(&info.created_date()))
    }

    /// The file named exactly `name`
    pub fn by_name(&self, name: &str) -> Result<LogFiles> {
        self.collect(|info| info.name == name)
    }

    /// List regular files in the directory without reading them
    ///
    /// A missing directory is treated as empty.
    pub fn files(&self) -> Result<Vec<LogFileInfo>> {
        let dir = match fs::read_dir(&self.directory) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SinkError::io(&self.directory, e)),
        };

        let mut files = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| SinkError::io(&self.directory, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match LogFileInfo::from_path(path.clone()) {
                Ok(info) => files.push(info),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn collect(&self, matches: impl Fn(&LogFileInfo) -> bool) -> Result<LogFiles> {
        let mut out = LogFiles::new();

        for info in self.files()?.into_iter().filter(|info| matches(info)) {
            match read_entries(&info.path) {
                Ok(entries) => {
                    out.insert(info, entries);
                }
                Err(e) => {
                    tracing::warn!(file = %info.name, error = %e, "skipping unparseable log file");
                }
            }
        }

        tracing::debug!(directory = %self.directory.display(), files = out.len(), "log files read");
        Ok(out)
    }
}

/// Read and parse one log file
pub fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let bytes = fs::read(path).map_err(|e| SinkError::io(path, e))?;
    parse_entries(&bytes).map_err(|e| match e {
        SinkError::Serialization(e) => SinkError::malformed(path, e.to_string()),
        other => other,
    })
}

/// Parse file content in either layout
///
/// Blank content parses as no entries.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<LogEntry>> {
    let Some(first) = bytes.iter().find(|b| !b.is_ascii_whitespace()) else {
        return Ok(Vec::new());
    };

    if *first == b'[' {
        return Ok(serde_json::from_slice(bytes)?);
    }

    let mut entries = Vec::new();
    for line in bytes.split(|b| *b == b'\n') {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        entries.push(serde_json::from_slice(line)?);
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod reader_test;

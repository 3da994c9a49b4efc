//! Append engine
//!
//! Persists a batch of entries into a destination file without reading or
//! rewriting the entries already there.
//!
//! # JSON array files
//!
//! A new (or zero-length) file receives the whole serialized array. An
//! existing file is spliced: only its tail is inspected.
//!
//! ```text
//! before:  [{"Message":"a"},{"Message":"b"}]\n
//!                                          ^ ^ trailing whitespace
//!                                          closing bracket
//! cut:     [{"Message":"a"},{"Message":"b"}
//! append:  ,{"Message":"c"}]
//! ```
//!
//! The tail scan walks backward from the end of the file over whitespace,
//! requires a `]`, then walks back over whitespace again to the last
//! significant byte. Everything after that byte is replaced. If that byte is
//! the opening `[` (empty array) no separating comma is written. The scan is
//! bounded by `tail_scan_limit`; a file whose delimiter is not found inside
//! that window is reported as malformed and left untouched.
//!
//! A write that fails part way is rolled back: the file is cut to the splice
//! point and the original tail rewritten, so only the failed batch is lost.
//!
//! # JSON Lines files
//!
//! Each entry is written as one compact object followed by `\n`. No splice;
//! a failed write truncates the file back to its previous length.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use logjar_config::{FileFormat, SinkConfig};

use crate::common::{Result, SinkError};
use crate::entry::LogEntry;

/// Serialization and splice settings taken from the sink config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOptions {
    /// Indent serialized entries
    pub pretty: bool,
    /// File layout
    pub format: FileFormat,
    /// Max trailing bytes inspected when splicing
    pub tail_scan_limit: usize,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self::from(&SinkConfig::default())
    }
}

impl From<&SinkConfig> for AppendOptions {
    fn from(config: &SinkConfig) -> Self {
        Self {
            pretty: config.pretty,
            format: config.format,
            tail_scan_limit: config.tail_scan_limit,
        }
    }
}

/// Where to cut an existing array file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SplicePoint {
    /// Bytes of the scanned tail to keep
    keep: usize,
    /// Whether the kept content ends in an element (needs `,`)
    needs_comma: bool,
}

/// What the tail scan found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    /// File holds nothing but whitespace
    Blank,
    Splice(SplicePoint),
}

/// Append `batch` to `directory/file_name`
///
/// Creates the directory if needed. Returns the number of bytes written.
pub fn append_batch(
    directory: &Path,
    file_name: &str,
    batch: &[LogEntry],
    options: &AppendOptions,
) -> Result<u64> {
    if batch.is_empty() {
        return Ok(0);
    }

    fs::create_dir_all(directory).map_err(|e| SinkError::CreateDirectory {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let path = directory.join(file_name);
    match options.format {
        FileFormat::JsonArray => append_array(&path, batch, options),
        FileFormat::JsonLines => append_lines(&path, batch),
    }
}

/// File operations used by the writers below
///
/// Implemented for `File`; tests substitute a target that fails mid-write.
trait AppendTarget: Read + Write + Seek {
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl AppendTarget for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

fn append_lines(path: &Path, batch: &[LogEntry]) -> Result<u64> {
    let mut buf = Vec::with_capacity(batch.len() * 256);
    for entry in batch {
        serde_json::to_writer(&mut buf, entry)?;
        buf.push(b'\n');
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| SinkError::io(path, e))?;
    let len = file.metadata().map_err(|e| SinkError::io(path, e))?.len();

    write_lines(&mut file, path, len, &buf)
}

/// Append `buf` at `len`; on failure the file is cut back to `len`
fn write_lines<F: AppendTarget>(file: &mut F, path: &Path, len: u64, buf: &[u8]) -> Result<u64> {
    if let Err(e) = write_at(file, len, buf) {
        restore(file, path, len, &[]);
        return Err(SinkError::io(path, e));
    }
    Ok(buf.len() as u64)
}

fn append_array(path: &Path, batch: &[LogEntry], options: &AppendOptions) -> Result<u64> {
    let array = if options.pretty {
        serde_json::to_vec_pretty(batch)?
    } else {
        serde_json::to_vec(batch)?
    };

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| SinkError::io(path, e))?;
    let len = file.metadata().map_err(|e| SinkError::io(path, e))?.len();

    if len == 0 {
        return write_whole(&mut file, path, &array);
    }

    splice(&mut file, path, len, &array, options.tail_scan_limit)
}

/// Replace the whole (blank) file with `array`; on failure the file is emptied
fn write_whole<F: AppendTarget>(file: &mut F, path: &Path, array: &[u8]) -> Result<u64> {
    if let Err(e) = write_at(file, 0, array) {
        restore(file, path, 0, &[]);
        return Err(SinkError::io(path, e));
    }
    Ok(array.len() as u64)
}

/// Splice `array` into the existing array file of length `len`
///
/// If the write fails the original tail is put back, so entries already in
/// the file stay readable and later batches can still splice.
fn splice<F: AppendTarget>(
    file: &mut F,
    path: &Path,
    len: u64,
    array: &[u8],
    scan_limit: usize,
) -> Result<u64> {
    let window = len.min(scan_limit as u64);
    let start = len - window;

    let mut tail = vec![0u8; window as usize];
    file.seek(SeekFrom::Start(start))
        .map_err(|e| SinkError::io(path, e))?;
    file.read_exact(&mut tail)
        .map_err(|e| SinkError::io(path, e))?;

    let point = match scan_tail(&tail, start == 0).map_err(|reason| SinkError::malformed(path, reason))? {
        Tail::Blank => return write_whole(file, path, array),
        Tail::Splice(point) => point,
    };

    let cut = start + point.keep as u64;
    let body = array_body(array);

    let mut out = Vec::with_capacity(body.len() + 2);
    if point.needs_comma {
        out.push(b',');
    }
    out.extend_from_slice(body);
    out.push(b']');

    if let Err(e) = write_at(file, cut, &out) {
        restore(file, path, cut, &tail[point.keep..]);
        return Err(SinkError::io(path, e));
    }

    Ok(out.len() as u64)
}

/// Truncate to `offset` and write `bytes` there
fn write_at<F: AppendTarget>(file: &mut F, offset: u64, bytes: &[u8]) -> io::Result<()> {
    file.set_len(offset)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(bytes)?;
    file.flush()
}

/// Roll a failed write back to `offset` followed by `original`
fn restore<F: AppendTarget>(file: &mut F, path: &Path, offset: u64, original: &[u8]) {
    if let Err(e) = write_at(file, offset, original) {
        tracing::error!(path = %path.display(), error = %e, "failed to roll back partial write");
    }
}

/// Locate the splice point inside the trailing window
///
/// `whole_file` is true when the window starts at byte 0, which lets a blank
/// file be recognised and distinguishes "malformed" from "window too small".
fn scan_tail(tail: &[u8], whole_file: bool) -> std::result::Result<Tail, String> {
    let close = match last_significant(tail, tail.len()) {
        Some(i) => i,
        None if whole_file => return Ok(Tail::Blank),
        None => return Err(format!("no closing ']' within the last {} bytes", tail.len())),
    };

    if tail[close] != b']' {
        return Err(format!(
            "expected ']' at end of file, found '{}'",
            tail[close].escape_ascii()
        ));
    }

    match last_significant(tail, close) {
        Some(prev) => Ok(Tail::Splice(SplicePoint {
            keep: prev + 1,
            needs_comma: tail[prev] != b'[',
        })),
        None if whole_file => Err("closing ']' without matching '['".to_string()),
        None => Err(format!(
            "no array content within the last {} bytes",
            tail.len()
        )),
    }
}

/// Index of the last non-whitespace byte before `end`
fn last_significant(bytes: &[u8], end: usize) -> Option<usize> {
    bytes[..end].iter().rposition(|b| !b.is_ascii_whitespace())
}

/// Serialized array without its enclosing brackets
fn array_body(array: &[u8]) -> &[u8] {
    let inner = array.strip_prefix(b"[").unwrap_or(array);
    inner.strip_suffix(b"]").unwrap_or(inner)
}

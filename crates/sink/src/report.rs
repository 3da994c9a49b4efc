//! Error report rendering
//!
//! Turns a `std::error::Error` into the message stored on a [`LogEntry`].
//!
//! - Non-verbose: `"<type name> : <message>"`
//! - Verbose: the same header followed by every error in the `source()`
//!   chain, one per paragraph
//!
//! Sources are `dyn Error`, so their concrete type names are not available;
//! they render as their display text.
//!
//! [`LogEntry`]: crate::LogEntry

use std::any::type_name;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;

/// Rendered description of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Formatted message
    pub message: String,
    /// Crate that defines the error type
    pub origin: String,
    /// Backtrace, when `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` enables capture
    pub backtrace: Option<String>,
}

impl ErrorReport {
    /// Render an error, capturing a backtrace if the environment allows it
    pub fn capture<E>(error: &E, verbose: bool) -> Self
    where
        E: Error + ?Sized + 'static,
    {
        let backtrace = Backtrace::capture();
        let backtrace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            message: format_error(error, verbose),
            origin: origin_of(type_name::<E>()).to_string(),
            backtrace,
        }
    }
}

/// Format an error and, if `verbose`, its source chain
///
/// The header uses the static type `E`. For `E = dyn Error` that is
/// `dyn core::error::Error`, not the erased concrete type.
pub fn format_error<E>(error: &E, verbose: bool) -> String
where
    E: Error + ?Sized + 'static,
{
    let mut out = format!("{} : {}", type_name::<E>(), error);
    if !verbose {
        return out;
    }

    let mut cause = error.source();
    while let Some(err) = cause {
        out.push_str("\n\n");
        out.push_str(&err.to_string());
        cause = err.source();
    }
    out
}

/// First path segment of a type name (`std::io::error::Error` -> `std`)
fn origin_of(type_name: &str) -> &str {
    let name = type_name.strip_prefix("dyn ").unwrap_or(type_name);
    name.split("::").next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::io;

    #[derive(Debug)]
    struct Outer(io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("failed to load settings")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_non_verbose_format() {
        let err = Outer(io::Error::new(io::ErrorKind::NotFound, "settings.toml"));
        let msg = format_error(&err, false);
        assert!(msg.ends_with("Outer : failed to load settings"), "{msg}");
        assert!(!msg.contains("settings.toml"));
    }

    #[test]
    fn test_verbose_includes_chain() {
        let err = Outer(io::Error::new(io::ErrorKind::NotFound, "settings.toml"));
        let msg = format_error(&err, true);

        let parts: Vec<&str> = msg.split("\n\n").collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].ends_with("Outer : failed to load settings"));
        assert_eq!(parts[1], "settings.toml");
    }

    #[test]
    fn test_verbose_without_sources_matches_plain() {
        let err = io::Error::new(io::ErrorKind::Other, "plain");
        assert_eq!(format_error(&err, true), format_error(&err, false));
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(origin_of("std::io::error::Error"), "std");
        assert_eq!(origin_of("logjar_sink::common::SinkError"), "logjar_sink");
        assert_eq!(origin_of("dyn core::error::Error"), "core");
        assert_eq!(origin_of("Local"), "Local");
    }

    #[test]
    fn test_dyn_error_renders_erased_type() {
        let boxed: Box<dyn Error + Send + Sync> = Box::new(Outer(io::Error::other("x")));
        let err: &(dyn Error + Send + Sync) = &*boxed;

        let msg = format_error(err, false);
        assert!(msg.starts_with("dyn "), "{msg}");
        assert!(msg.ends_with(" : failed to load settings"), "{msg}");
        assert_eq!(ErrorReport::capture(err, false).origin, "core");
    }

    #[test]
    fn test_capture_origin() {
        let err = Outer(io::Error::new(io::ErrorKind::Other, "x"));
        let report = ErrorReport::capture(&err, false);
        assert_eq!(report.origin, "logjar_sink");
    }
}

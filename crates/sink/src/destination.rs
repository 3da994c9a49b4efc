//! Destination resolution
//!
//! Computes the file name an entry is written to. Either a custom
//! [`FileNamer`] decides, or the configured template has its `{date}`
//! placeholder replaced with the local date (`YYYYMMDD`).

use std::sync::Arc;

use chrono::{DateTime, Local};
use logjar_config::DATE_PLACEHOLDER;

use crate::common::{Result, SinkError};

/// Date format substituted for the template placeholder
const DATE_FORMAT: &str = "%Y%m%d";

/// Error type returned by custom namers
pub type NamerError = Box<dyn std::error::Error + Send + Sync>;

/// Custom naming strategy
///
/// Called once per submitted entry. The returned name is used as-is.
pub trait FileNamer: Send + Sync {
    fn file_name(&self, now: DateTime<Local>) -> std::result::Result<String, NamerError>;
}

impl<F> FileNamer for F
where
    F: Fn(DateTime<Local>) -> std::result::Result<String, NamerError> + Send + Sync,
{
    fn file_name(&self, now: DateTime<Local>) -> std::result::Result<String, NamerError> {
        self(now)
    }
}

/// Resolves the destination file name for a point in time
#[derive(Clone)]
pub struct DestinationResolver {
    template: String,
    namer: Option<Arc<dyn FileNamer>>,
}

impl DestinationResolver {
    /// Create a resolver from a file name template
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            namer: None,
        }
    }

    /// Use a custom namer instead of the template
    #[must_use]
    pub fn with_namer(mut self, namer: Arc<dyn FileNamer>) -> Self {
        self.namer = Some(namer);
        self
    }

    /// Resolve for the current local time
    pub fn resolve(&self) -> Result<String> {
        self.resolve_at(Local::now())
    }

    /// Resolve for a given local time
    pub fn resolve_at(&self, now: DateTime<Local>) -> Result<String> {
        let name = match &self.namer {
            Some(namer) => namer
                .file_name(now)
                .map_err(|e| SinkError::resolve(e.to_string()))?,
            None => self
                .template
                .replace(DATE_PLACEHOLDER, &now.format(DATE_FORMAT).to_string()),
        };

        if name.is_empty() {
            return Err(SinkError::resolve("file name is empty"));
        }
        Ok(name)
    }
}

impl std::fmt::Debug for DestinationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationResolver")
            .field("template", &self.template)
            .field("custom_namer", &self.namer.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "destination_test.rs"]
mod destination_test;

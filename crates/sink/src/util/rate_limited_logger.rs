//! Rate-limited error logging
//!
//! A writer stuck on a persistent failure (disk full, read-only mount) fails
//! every flush. This logger emits at most one line per interval and reports
//! how many failures were suppressed in between.

use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between logged errors
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Rate-limited logger for sink failures
///
/// Thread-safe: counters are atomic, the last log time sits behind a mutex.
pub struct RateLimitedLogger {
    min_interval: Duration,
    last_log_time: Mutex<Option<Instant>>,
    /// Errors since the last emitted line
    error_count: AtomicU64,
    total_errors: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a logger that emits at most once per `min_interval`
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_log_time: Mutex::new(None),
            error_count: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
        }
    }

    /// Record an error and log it if the interval has elapsed
    ///
    /// Returns true if the error was logged, false if it was suppressed.
    pub fn error(&self, error: &(dyn Error + 'static)) -> bool {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        let total = self.total_errors.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.should_log() {
            return false;
        }

        let count = self.error_count.swap(0, Ordering::Relaxed);
        let cause = error.source().map(|s| s.to_string());

        if count > 1 {
            tracing::error!(
                error = %error,
                cause = cause.as_deref().unwrap_or(""),
                suppressed_count = count - 1,
                total_errors = total,
                "log sink failure (rate-limited)"
            );
        } else {
            tracing::error!(
                error = %error,
                cause = cause.as_deref().unwrap_or(""),
                total_errors = total,
                "log sink failure"
            );
        }
        true
    }

    fn should_log(&self) -> bool {
        let mut last_time = self.last_log_time.lock();
        let now = Instant::now();

        match *last_time {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                *last_time = Some(now);
                true
            }
        }
    }

    /// Errors recorded since the last emitted line
    pub fn pending_error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn total_error_count(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}

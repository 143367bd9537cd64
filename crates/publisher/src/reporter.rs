use std::error::Error as StdError;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::error;

/// Sink for diagnostic reports about failed calls.
///
/// Reporting is fire-and-forget: implementations must not block or panic.
pub trait ErrorReporter
where
    Self: Debug + Send + Sync + 'static,
{
    /// Records `error` together with a human-readable context message.
    fn report(&self, error: &(dyn StdError + 'static), message: &str);
}

/// Reports through `tracing` at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &(dyn StdError + 'static), message: &str) {
        error!(error = %error, "xk6-pubsub: {message}");
    }
}

/// A single captured report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// The error's display form.
    pub error: String,

    /// The context message supplied with it.
    pub message: String,
}

/// Keeps reports in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemoryReporter {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports captured so far, oldest first.
    #[must_use]
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ErrorReporter for MemoryReporter {
    fn report(&self, error: &(dyn StdError + 'static), message: &str) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Report {
                error: error.to_string(),
                message: message.to_string(),
            });
    }
}

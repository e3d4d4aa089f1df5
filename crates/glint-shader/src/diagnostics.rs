//! Diagnostics sink for non-fatal import issues
//!
//! Missing includes, overwritten registrations and per-backend compile
//! failures are reported here instead of aborting the surrounding unit
//! of work. The sink never feeds errors back into the pipeline.

use std::sync::Mutex;

/// Severity of a reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Receiver for non-fatal pipeline diagnostics.
pub trait Diagnostics: Send + Sync {
    fn report(&self, severity: Severity, message: &str);
}

/// Default sink routing diagnostics to the `log` crate.
pub struct LogSink;

impl Diagnostics for LogSink {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Warning => log::warn!("{message}"),
            Severity::Error => log::error!("{message}"),
        }
    }
}

/// Sink that records reports for later inspection. Used by tests and
/// by embedders that surface import issues in their own UI.
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(severity, _)| *severity == Severity::Error)
            .count()
    }
}

impl Diagnostics for RecordingSink {
    fn report(&self, severity: Severity, message: &str) {
        self.entries.lock().unwrap().push((severity, message.to_string()));
    }
}

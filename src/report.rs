//! Diagnostics and the sinks that collect them.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// A compliance problem found on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// URL of the resource.
    pub resource_url: String,
    /// Element that caused the fetch, if any.
    pub element: Option<String>,
    /// Human readable description.
    pub message: String,
}

/// Receives diagnostics as the audit produces them.
///
/// Reports are fire-and-forget. Implementations must accept reports from
/// several resources audited concurrently.
pub trait ReportSink: Send + Sync {
    /// Records one diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

impl<T: ReportSink + ?Sized> ReportSink for Arc<T> {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

impl<T: ReportSink + ?Sized> ReportSink for &T {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

impl ReportSink for UnboundedSender<Diagnostic> {
    fn report(&self, diagnostic: Diagnostic) {
        // A closed receiver means nobody is listening anymore
        let _ = self.send(diagnostic);
    }
}

/// In-memory, append-only diagnostic stream.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything reported so far, in report order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Returns the messages reported so far.
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }

    /// Returns the number of diagnostics reported so far.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ReportSink for DiagnosticLog {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

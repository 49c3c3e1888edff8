//! Error reporting shared by the lifecycle layer and every view
//!
//! Failures are always returned to the caller as well; reporting is the one
//! place user-visible presentation hooks in (logs, a status line, a dialog).

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Where a failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Template/stylesheet build of a component
    Lifecycle,
    /// REST call issued by a view
    Api,
    /// Anything a view could not render from otherwise valid data
    Render,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lifecycle => "lifecycle",
            Self::Api => "api",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported failure
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub timestamp: DateTime<Utc>,
    /// Template identifier or view tag the failure belongs to
    pub component: String,
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status, when the failure came from a response
    pub status: Option<u16>,
}

impl ErrorReport {
    pub fn new(component: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            component: component.into(),
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }
}

/// Sink for failures
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// Logs every report through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, report: ErrorReport) {
        match report.status {
            Some(status) => tracing::error!(
                component = %report.component,
                kind = %report.kind,
                status,
                "{}",
                report.message
            ),
            None => tracing::error!(
                component = %report.component,
                kind = %report.kind,
                "{}",
                report.message
            ),
        }
    }
}

/// Keeps every report in memory, optionally forwarding to another reporter
#[derive(Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<ErrorReport>>>,
    forward: Option<Arc<dyn ErrorReporter>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and pass each report on to `inner`
    pub fn forwarding(inner: Arc<dyn ErrorReporter>) -> Self {
        Self {
            reports: Arc::default(),
            forward: Some(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ErrorReport>> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, report: ErrorReport) {
        if let Some(inner) = &self.forward {
            inner.report(report.clone());
        }
        self.lock().push(report);
    }
}

impl fmt::Debug for RecordingReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingReporter")
            .field("reports", &self.len())
            .field("forwarding", &self.forward.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_forwards() {
        let inner = RecordingReporter::new();
        let outer = RecordingReporter::forwarding(Arc::new(inner.clone()));
        outer.report(ErrorReport::new("viki-llm-canvas", ErrorKind::Api, "boom").with_status(Some(500)));

        assert_eq!(outer.len(), 1);
        assert_eq!(inner.len(), 1);
        let report = &inner.reports()[0];
        assert_eq!(report.component, "viki-llm-canvas");
        assert_eq!(report.kind, ErrorKind::Api);
        assert_eq!(report.status, Some(500));
    }
}

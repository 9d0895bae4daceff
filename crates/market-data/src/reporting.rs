//! Error-reporting sink.
//!
//! Providers and the fallback coordinator report recoverable problems here
//! (a malformed price record, a security whose profile no vendor could
//! supply) instead of failing the whole operation. The host application
//! plugs in its error tracker by implementing [`ErrorReporter`].
//!
//! `capture()` must be fast and must never fail the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{error, warn};

/// Severity attached to a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Warning,
    Error,
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A single captured problem.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorReport {
    /// Error class name (e.g., "InvalidSecurityPriceError")
    pub error: String,
    /// Human readable message
    pub message: String,
    pub level: ReportLevel,
    /// Indexed key/value pairs for grouping
    pub tags: BTreeMap<String, String>,
    /// Named context blocks (e.g., "security" -> {"symbol": "AAPL"})
    pub context: BTreeMap<String, serde_json::Value>,
}

impl ErrorReport {
    pub fn warning(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            level: ReportLevel::Warning,
            tags: BTreeMap::new(),
            context: BTreeMap::new(),
        }
    }

    pub fn error(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Error,
            ..Self::warning(error, message)
        }
    }

    /// Add a tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a context block
    pub fn context(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(name.into(), value);
        self
    }
}

/// Trait for receiving error reports.
pub trait ErrorReporter: Send + Sync {
    fn capture(&self, report: ErrorReport);
}

/// Default reporter: writes reports to the log.
#[derive(Clone, Debug, Default)]
pub struct LogErrorReporter;

impl ErrorReporter for LogErrorReporter {
    fn capture(&self, report: ErrorReport) {
        let context = serde_json::to_string(&report.context).unwrap_or_default();
        match report.level {
            ReportLevel::Warning => warn!(
                "[{}] {} tags={:?} context={}",
                report.error, report.message, report.tags, context
            ),
            ReportLevel::Error => error!(
                "[{}] {} tags={:?} context={}",
                report.error, report.message, report.tags, context
            ),
        }
    }
}

/// Mock reporter for testing - collects captured reports.
#[derive(Clone, Debug, Default)]
pub struct MockErrorReporter {
    reports: Arc<Mutex<Vec<ErrorReport>>>,
}

impl MockErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured reports.
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    /// Returns the number of captured reports.
    pub fn len(&self) -> usize {
        self.reports.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for MockErrorReporter {
    fn capture(&self, report: ErrorReport) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report);
        }
    }
}

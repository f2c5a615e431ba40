//! Events streamed from a running scan to its host.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Diagnostic, Severity};
use crate::report::ScanReport;

/// Level of a user-facing log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl From<Severity> for LogLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => LogLevel::Info,
            Severity::Warning => LogLevel::Warning,
            Severity::Error => LogLevel::Error,
        }
    }
}

/// A diagnostic line for display. Never an exit signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// Create a log line stamped with the current time.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl From<&Diagnostic> for LogEvent {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self::new(diagnostic.severity.into(), diagnostic.message.clone())
    }
}

/// Throttled progress snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Estimated completion in percent. Stays within [0, 95] until the
    /// scan has finished, then a single 100 is reported.
    pub percent: f64,
    /// Entries visited so far (files and directories).
    pub processed_count: u64,
    /// Most recently visited path.
    pub current_path: PathBuf,
    /// Smoothed throughput in entries per second.
    pub scan_rate_per_second: f64,
}

/// Everything a scan reports to its host.
///
/// A scan emits `Start`, then any interleaving of `Log` and `Progress`,
/// then exactly one of `Complete` or `Error`. A cancelled scan emits no
/// terminal event at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScanEvent {
    /// Scan has begun.
    Start { root: PathBuf },
    /// Diagnostic for display.
    Log(LogEvent),
    /// Liveness and completion estimate.
    Progress(ScanProgress),
    /// Terminal success. Shares the tree returned by the scan.
    Complete(Arc<ScanReport>),
    /// Terminal failure.
    Error { message: String },
}

impl ScanEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanEvent::Complete(_) | ScanEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_severity() {
        assert_eq!(LogLevel::from(Severity::Info), LogLevel::Info);
        assert_eq!(LogLevel::from(Severity::Error), LogLevel::Error);
    }

    #[test]
    fn test_event_tagging() {
        let event = ScanEvent::Error {
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "boom");
        assert!(event.is_terminal());
        assert!(
            !ScanEvent::Start {
                root: PathBuf::from("/")
            }
            .is_terminal()
        );
    }
}

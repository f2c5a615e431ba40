//! Error and diagnostic types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that end a scan.
///
/// Failures below the scan root never surface here; they are recovered
/// locally and reported as [`Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for the scan root.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Scan root not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error on the scan root.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scan root is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The scan was cancelled before it completed.
    #[error("Scan cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Check whether this error is the result of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanError::Cancelled)
    }
}

/// Classification of a recovered failure or deliberate skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Entry vanished between listing and stat.
    NotFound,
    /// Access was refused by the OS.
    PermissionDenied {
        /// Whether rerunning with elevated rights would likely succeed.
        elevation_likely_helps: bool,
    },
    /// Too many open file descriptors or handles.
    ResourceExhausted,
    /// Directory matched the protected-path table and was never opened.
    ProtectedPathSkipped,
    /// Directory was already visited through another symlink.
    CycleSkipped,
    /// Directory lies below the configured maximum depth.
    DepthLimitReached,
    /// Anything else.
    Other,
}

impl FailureKind {
    /// Deliberate skips are not counted as errors.
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            FailureKind::ProtectedPathSkipped
                | FailureKind::CycleSkipped
                | FailureKind::DepthLimitReached
        )
    }

    /// Short human-readable category.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "Not found",
            FailureKind::PermissionDenied {
                elevation_likely_helps: true,
            } => "Administrator rights required",
            FailureKind::PermissionDenied { .. } => "Access denied",
            FailureKind::ResourceExhausted => "Too many open files",
            FailureKind::ProtectedPathSkipped => "Protected system directory skipped",
            FailureKind::CycleSkipped => "Directory already visited",
            FailureKind::DepthLimitReached => "Maximum depth reached",
            FailureKind::Other => "I/O error",
        }
    }
}

/// What a failure cost the result tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureScope {
    /// A single entry was omitted.
    Entry,
    /// A whole directory could not be read; its subtree is missing.
    Directory,
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Structured description of one recovered failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Path the failure occurred at.
    pub path: PathBuf,
    /// Failure classification.
    pub kind: FailureKind,
    /// Entry- or directory-level.
    pub scope: FailureScope,
    /// Severity for display.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_skips_are_not_errors() {
        assert!(!FailureKind::ProtectedPathSkipped.is_error());
        assert!(!FailureKind::CycleSkipped.is_error());
        assert!(FailureKind::ResourceExhausted.is_error());
        assert!(
            FailureKind::PermissionDenied {
                elevation_likely_helps: false
            }
            .is_error()
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}

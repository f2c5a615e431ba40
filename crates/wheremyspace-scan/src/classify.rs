//! Classification of IO failures into diagnostics and scan counters.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use wheremyspace_core::{Diagnostic, FailureKind, FailureScope, PathClassifier, ScanStats, Severity};

/// Raw OS codes for "too many open files".
#[cfg(unix)]
const TOO_MANY_OPEN_FILES: &[i32] = &[23, 24]; // ENFILE, EMFILE
#[cfg(windows)]
const TOO_MANY_OPEN_FILES: &[i32] = &[4]; // ERROR_TOO_MANY_OPEN_FILES
#[cfg(not(any(unix, windows)))]
const TOO_MANY_OPEN_FILES: &[i32] = &[];

/// Scan-level failure counters, shared by every worker.
#[derive(Debug, Default)]
pub struct ScanCounters {
    errors: AtomicU64,
    ignored_directories: AtomicU64,
    permission_denied: AtomicU64,
    elevation_required: AtomicU64,
}

impl ScanCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, diagnostic: &Diagnostic) {
        if diagnostic.kind.is_error() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        if let FailureKind::PermissionDenied {
            elevation_likely_helps,
        } = diagnostic.kind
        {
            self.permission_denied.fetch_add(1, Ordering::Relaxed);
            if elevation_likely_helps {
                self.elevation_required.fetch_add(1, Ordering::Relaxed);
            }
        }
        if diagnostic.scope == FailureScope::Directory {
            self.ignored_directories.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of IO failures so far.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Number of skipped or abandoned directories so far.
    pub fn ignored_directories(&self) -> u64 {
        self.ignored_directories.load(Ordering::Relaxed)
    }

    /// Number of permission failures so far.
    pub fn permission_denied(&self) -> u64 {
        self.permission_denied.load(Ordering::Relaxed)
    }

    /// Number of permission failures that elevation would likely fix.
    pub fn elevation_required(&self) -> u64 {
        self.elevation_required.load(Ordering::Relaxed)
    }

    /// Copy the counters into a stats block.
    pub fn apply_to(&self, stats: &mut ScanStats) {
        stats.error_count = self.errors();
        stats.ignored_directory_count = self.ignored_directories();
        stats.permission_denied_count = self.permission_denied();
        stats.elevated_privilege_required_count = self.elevation_required();
    }
}

/// Maps raw IO failures to [`Diagnostic`]s and keeps the scan counters.
#[derive(Debug)]
pub struct ErrorClassifier {
    paths: PathClassifier,
    counters: ScanCounters,
}

impl ErrorClassifier {
    /// Create a classifier backed by the given path heuristics.
    pub fn new(paths: PathClassifier) -> Self {
        Self {
            paths,
            counters: ScanCounters::new(),
        }
    }

    /// Path heuristics in use.
    pub fn paths(&self) -> &PathClassifier {
        &self.paths
    }

    /// Counters accumulated so far.
    pub fn counters(&self) -> &ScanCounters {
        &self.counters
    }

    /// Classify an IO failure without touching the counters.
    pub fn classify(&self, error: &io::Error, path: &Path, scope: FailureScope) -> Diagnostic {
        let kind = self.failure_kind(error, path);
        let severity = severity(kind, scope);
        let message = match scope {
            FailureScope::Directory => format!(
                "Failed to scan directory {}: {} ({error})",
                path.display(),
                kind.label()
            ),
            FailureScope::Entry => format!("{}: {} ({error})", kind.label(), path.display()),
        };

        Diagnostic {
            path: path.to_path_buf(),
            kind,
            scope,
            severity,
            message,
        }
    }

    /// Classify an IO failure and count it.
    pub fn record(&self, error: &io::Error, path: &Path, scope: FailureScope) -> Diagnostic {
        let diagnostic = self.classify(error, path, scope);
        self.counters.record(&diagnostic);
        diagnostic
    }

    /// Record a directory that is deliberately not opened.
    pub fn skipped(&self, path: &Path, kind: FailureKind) -> Diagnostic {
        let diagnostic = Diagnostic {
            path: path.to_path_buf(),
            kind,
            scope: FailureScope::Directory,
            severity: severity(kind, FailureScope::Directory),
            message: format!("{}: {}", kind.label(), path.display()),
        };
        self.counters.record(&diagnostic);
        diagnostic
    }

    fn failure_kind(&self, error: &io::Error, path: &Path) -> FailureKind {
        match error.kind() {
            io::ErrorKind::NotFound => FailureKind::NotFound,
            io::ErrorKind::PermissionDenied => FailureKind::PermissionDenied {
                elevation_likely_helps: self.paths.requires_elevated_privilege(path),
            },
            _ if is_resource_exhausted(error) => FailureKind::ResourceExhausted,
            _ => FailureKind::Other,
        }
    }
}

fn is_resource_exhausted(error: &io::Error) -> bool {
    error
        .raw_os_error()
        .is_some_and(|code| TOO_MANY_OPEN_FILES.contains(&code))
}

fn severity(kind: FailureKind, scope: FailureScope) -> Severity {
    match kind {
        FailureKind::ProtectedPathSkipped | FailureKind::CycleSkipped => Severity::Info,
        FailureKind::PermissionDenied {
            elevation_likely_helps: true,
        } => Severity::Info,
        FailureKind::DepthLimitReached => Severity::Warning,
        FailureKind::Other => Severity::Error,
        _ => match scope {
            FailureScope::Entry => Severity::Warning,
            FailureScope::Directory => Severity::Error,
        },
    }
}

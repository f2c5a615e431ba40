//! Shared state for one running scan.

use std::io;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use wheremyspace_core::{Diagnostic, FailureKind, FailureScope, LogEvent, ScanConfig, ScanEvent};

use crate::classify::ErrorClassifier;
use crate::controller::EventSink;
use crate::progress::ProgressEstimator;
use crate::visited::VisitedDirs;

/// Everything the workers of a single scan share.
pub(crate) struct ScanContext<'a> {
    pub config: &'a ScanConfig,
    pub errors: ErrorClassifier,
    pub progress: ProgressEstimator,
    pub visited: VisitedDirs,
    cancel: CancellationToken,
    sink: &'a dyn EventSink,
}

impl<'a> ScanContext<'a> {
    pub fn new(config: &'a ScanConfig, cancel: CancellationToken, sink: &'a dyn EventSink) -> Self {
        Self {
            config,
            errors: ErrorClassifier::new(config.classifier()),
            progress: ProgressEstimator::new(config.progress_interval, config.progress_every),
            visited: VisitedDirs::new(),
            cancel,
            sink,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn emit(&self, event: ScanEvent) {
        self.sink.emit(event);
    }

    /// Classify, count and report an IO failure.
    pub fn failure(&self, error: &io::Error, path: &Path, scope: FailureScope) {
        let diagnostic = self.errors.record(error, path, scope);
        self.log(&diagnostic);
    }

    /// Count and report a directory that is deliberately not opened.
    pub fn skip(&self, path: &Path, kind: FailureKind) {
        let diagnostic = self.errors.skipped(path, kind);
        self.log(&diagnostic);
    }

    /// Feed the progress estimator. No progress is emitted once the scan
    /// has been cancelled.
    pub fn processed(&self, count: u64, path: &Path) {
        self.progress.on_processed(count, path, |progress| {
            if !self.cancel.is_cancelled() {
                self.sink.emit(ScanEvent::Progress(progress));
            }
        });
    }

    fn log(&self, diagnostic: &Diagnostic) {
        debug!(
            path = %diagnostic.path.display(),
            kind = diagnostic.kind.label(),
            severity = ?diagnostic.severity,
            "{}",
            diagnostic.message
        );
        self.sink.emit(ScanEvent::Log(LogEvent::from(diagnostic)));
    }
}

//! Scan orchestration, cancellation and event delivery.

use std::fs;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wheremyspace_core::{
    LogEvent, LogLevel, ScanConfig, ScanError, ScanEvent, ScanReport, ScanStats,
};

use crate::aggregate::TreeAggregator;
use crate::context::ScanContext;
use crate::visited::DirId;

/// Worker stack size. Recursion depth is bounded by `max_depth`, and each
/// level nests a rayon join on the worker's stack.
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

/// Receives the events of a running scan.
///
/// Called from scan worker threads, possibly concurrently.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ScanEvent);
}

impl<F> EventSink for F
where
    F: Fn(ScanEvent) + Send + Sync,
{
    fn emit(&self, event: ScanEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub mpsc::UnboundedSender<ScanEvent>);

impl EventSink for ChannelSink {
    fn emit(&self, event: ScanEvent) {
        // A dropped receiver only means nobody is listening anymore.
        let _ = self.0.send(event);
    }
}

/// Lifecycle of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ScanState {
    /// Whether the scan has reached a final state.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ScanState::Completed | ScanState::Failed | ScanState::Cancelled
        )
    }
}

/// Owns one scan invocation from start to terminal state.
#[derive(Debug)]
pub struct ScanController {
    config: ScanConfig,
    cancel: CancellationToken,
    state: watch::Sender<ScanState>,
}

impl ScanController {
    /// Create an idle controller.
    pub fn new(config: ScanConfig) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            config,
            cancel: CancellationToken::new(),
            state,
        }
    }

    /// Configuration this controller runs with.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Request cancellation. Takes effect at the next directory or entry.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token observed by the walk; cancelling it cancels the scan.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// Run the scan on the calling thread, streaming events into `sink`.
    ///
    /// Emits `Start`, then logs and progress, then exactly one of
    /// `Complete` or `Error`. A cancelled scan emits neither and returns
    /// [`ScanError::Cancelled`]. A controller runs at most once.
    pub fn run(&self, sink: &dyn EventSink) -> Result<Arc<ScanReport>, ScanError> {
        let started = self.state.send_if_modified(|state| {
            if *state == ScanState::Idle {
                *state = ScanState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(ScanError::Other {
                message: "scan controller has already been run".to_string(),
            });
        }

        let root = self.config.root.clone();
        info!(root = %root.display(), platform = %self.config.platform, "starting scan");
        sink.emit(ScanEvent::Start { root: root.clone() });
        sink.emit(ScanEvent::Log(LogEvent::new(
            LogLevel::Info,
            format!("Scanning {}", root.display()),
        )));

        match self.execute(sink) {
            Ok(report) => {
                self.state.send_replace(ScanState::Completed);
                Ok(report)
            }
            Err(ScanError::Cancelled) => {
                info!(root = %root.display(), "scan cancelled");
                self.state.send_replace(ScanState::Cancelled);
                Err(ScanError::Cancelled)
            }
            Err(err) => {
                warn!(root = %root.display(), error = %err, "scan failed");
                sink.emit(ScanEvent::Error {
                    message: err.to_string(),
                });
                self.state.send_replace(ScanState::Failed);
                Err(err)
            }
        }
    }

    fn execute(&self, sink: &dyn EventSink) -> Result<Arc<ScanReport>, ScanError> {
        let start = Instant::now();
        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let root = self
            .config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&self.config.root, e))?;
        let metadata = fs::metadata(&root).map_err(|e| ScanError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let ctx = ScanContext::new(&self.config, self.cancel.clone(), sink);
        if self.config.follow_symlinks {
            if let Some(id) = DirId::from_metadata(&metadata) {
                ctx.visited.track(id);
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|i| format!("wms-scan-{i}"))
            .build()
            .map_err(|e| ScanError::Other {
                message: format!("Failed to start scan workers: {e}"),
            })?;

        let tree = pool.install(|| TreeAggregator::new(&ctx).scan_root(&root))?;
        if ctx.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut stats = ScanStats::new(self.config.platform);
        stats.total_files = tree.file_count;
        stats.total_directories = tree.dir_count;
        stats.total_size = tree.size;
        ctx.errors.counters().apply_to(&mut stats);
        stats.duration_ms = start.elapsed().as_millis() as u64;

        let report = Arc::new(ScanReport::new(tree, root, stats));
        let summary = format!(
            "Scan complete: {} files, {} directories, {} bytes",
            report.stats.total_files, report.stats.total_directories, report.stats.total_size
        );
        info!(
            files = report.stats.total_files,
            directories = report.stats.total_directories,
            bytes = report.stats.total_size,
            errors = report.stats.error_count,
            ignored = report.stats.ignored_directory_count,
            duration_ms = report.stats.duration_ms,
            "scan complete"
        );

        ctx.emit(ScanEvent::Progress(ctx.progress.finish()));
        ctx.emit(ScanEvent::Log(LogEvent::new(LogLevel::Success, summary)));
        ctx.emit(ScanEvent::Complete(Arc::clone(&report)));
        Ok(report)
    }
}

/// Handle to a scan running on the tokio blocking pool.
#[derive(Debug)]
pub struct ScanHandle {
    events: mpsc::UnboundedReceiver<ScanEvent>,
    cancel: CancellationToken,
    state: watch::Receiver<ScanState>,
    task: JoinHandle<Result<Arc<ScanReport>, ScanError>>,
}

impl ScanHandle {
    /// Next event, or `None` once the scan has ended and every event has
    /// been received.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ScanState> {
        self.state.clone()
    }

    /// Wait for the scan to finish and return its outcome.
    pub async fn join(self) -> Result<Arc<ScanReport>, ScanError> {
        self.task.await.unwrap_or_else(|e| {
            Err(ScanError::Other {
                message: format!("Scan task failed: {e}"),
            })
        })
    }
}

/// Start a scan on the tokio blocking pool. Must be called from within a
/// tokio runtime.
pub fn start_scan(config: ScanConfig) -> ScanHandle {
    let (tx, events) = mpsc::unbounded_channel();
    let controller = ScanController::new(config);
    let cancel = controller.cancellation_token();
    let state = controller.subscribe_state();

    let task = tokio::task::spawn_blocking(move || controller.run(&ChannelSink(tx)));

    ScanHandle {
        events,
        cancel,
        state,
        task,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_controller_runs_once() {
        let temp = tempfile::TempDir::new().unwrap();
        let controller = ScanController::new(ScanConfig::new(temp.path()));
        let sink = |_event: ScanEvent| {};

        assert_eq!(controller.state(), ScanState::Idle);
        assert!(controller.run(&sink).is_ok());
        assert_eq!(controller.state(), ScanState::Completed);
        assert!(controller.run(&sink).is_err());
        assert_eq!(controller.state(), ScanState::Completed);
    }

    #[test]
    fn test_not_a_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let events = Mutex::new(Vec::new());
        let sink = |event: ScanEvent| events.lock().unwrap().push(event);
        let controller = ScanController::new(ScanConfig::new(&file));

        let err = controller.run(&sink).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
        assert_eq!(controller.state(), ScanState::Failed);

        let events = events.into_inner().unwrap();
        assert!(matches!(events.first(), Some(ScanEvent::Start { .. })));
        assert!(matches!(events.last(), Some(ScanEvent::Error { .. })));
    }

    #[test]
    fn test_state_helpers() {
        assert!(!ScanState::Running.is_finished());
        assert!(ScanState::Cancelled.is_finished());
    }
}

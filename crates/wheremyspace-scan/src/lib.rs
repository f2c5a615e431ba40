//! Directory scanning engine for wheremyspace.
//!
//! # Overview
//!
//! `wheremyspace-scan` walks a directory tree and builds a size-aggregated
//! [`ScanNode`] tree. Key features:
//!
//! - **Parallel fan-out/fan-in** over sibling directories via rayon
//! - **Recoverable failures**: unreadable entries and directories are
//!   classified, counted and reported, never fatal below the root
//! - **Protected paths** from per-platform tables are never opened
//! - **Bounded memory**: each directory keeps only its largest children
//! - **Throttled progress** with an eased completion estimate
//! - **Cooperative cancellation**
//!
//! # Example
//!
//! ```rust,no_run
//! use wheremyspace_scan::{ScanConfig, ScanController, ScanEvent};
//!
//! let controller = ScanController::new(ScanConfig::new("/path/to/scan"));
//! let sink = |event: ScanEvent| {
//!     if let ScanEvent::Progress(p) = event {
//!         eprintln!("{:.0}% {}", p.percent, p.current_path.display());
//!     }
//! };
//! let report = controller.run(&sink).unwrap();
//!
//! println!("Total size: {} bytes", report.total_size());
//! println!("Total files: {}", report.total_files());
//! ```
//!
//! # Async hosts
//!
//! ```rust,no_run
//! use wheremyspace_scan::{ScanConfig, ScanEvent, start_scan};
//!
//! # async fn demo() {
//! let mut handle = start_scan(ScanConfig::new("/path/to/scan"));
//! while let Some(event) = handle.next_event().await {
//!     if let ScanEvent::Complete(report) = event {
//!         println!("{} bytes", report.total_size());
//!     }
//! }
//! let _ = handle.join().await;
//! # }
//! ```

mod aggregate;
mod classify;
mod context;
mod controller;
mod progress;
mod targets;
mod visited;

pub use classify::{ErrorClassifier, ScanCounters};
pub use controller::{ChannelSink, EventSink, ScanController, ScanHandle, ScanState, start_scan};
pub use progress::ProgressEstimator;
pub use targets::{ScanTarget, TargetKind, suggest_targets};
pub use visited::{DirId, VisitedDirs};

// Re-export core types for convenience
pub use wheremyspace_core::{
    Diagnostic, FailureKind, FailureScope, LogEvent, LogLevel, NodeKind, PathClassifier, PathRule,
    Platform, ScanConfig, ScanError, ScanEvent, ScanNode, ScanProgress, ScanReport, ScanStats, Severity,
};

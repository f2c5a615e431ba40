//! Core types for wheremyspace.
//!
//! This crate provides the data structures shared by the scanning engine
//! and its hosts: result nodes, summary statistics, the event stream,
//! configuration, and the per-platform path heuristics.

mod config;
mod error;
mod event;
mod node;
mod platform;
mod report;

pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{Diagnostic, FailureKind, FailureScope, ScanError, Severity};
pub use event::{LogEvent, LogLevel, ScanEvent, ScanProgress};
pub use node::{NodeIter, NodeKind, ScanNode, compare_by_size};
pub use platform::{PathClassifier, PathRule, PathRules, Platform};
pub use report::{ScanReport, ScanStats};

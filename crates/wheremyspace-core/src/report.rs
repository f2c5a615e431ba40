//! Scan result container and summary statistics.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::node::ScanNode;
use crate::platform::Platform;

/// Summary statistics, produced once at completion.
///
/// All totals are independent of child truncation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total number of files.
    pub total_files: u64,
    /// Total number of directories below the root.
    pub total_directories: u64,
    /// Total size in bytes.
    pub total_size: u64,
    /// IO failures, per entry or per directory.
    pub error_count: u64,
    /// Directories skipped outright or abandoned after a read failure.
    pub ignored_directory_count: u64,
    /// Errors classified as permission denied.
    pub permission_denied_count: u64,
    /// Permission errors that elevation would likely fix.
    pub elevated_privilege_required_count: u64,
    /// Wall-clock duration of the scan.
    pub duration_ms: u64,
    /// Platform the path heuristics were evaluated against.
    pub platform: Platform,
}

impl ScanStats {
    /// Create empty stats for a platform.
    pub fn new(platform: Platform) -> Self {
        Self {
            total_files: 0,
            total_directories: 0,
            total_size: 0,
            error_count: 0,
            ignored_directory_count: 0,
            permission_denied_count: 0,
            elevated_privilege_required_count: 0,
            duration_ms: 0,
            platform,
        }
    }

    /// Whether the reported size is only a lower bound.
    pub fn is_partial(&self) -> bool {
        self.error_count > 0 || self.ignored_directory_count > 0
    }
}

/// Complete scan result handed to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Root node of the tree.
    pub root: ScanNode,

    /// Root path that was scanned.
    pub root_path: PathBuf,

    /// When this scan finished.
    pub scanned_at: SystemTime,

    /// Summary statistics.
    pub stats: ScanStats,
}

impl ScanReport {
    /// Create a new report.
    pub fn new(root: ScanNode, root_path: PathBuf, stats: ScanStats) -> Self {
        Self {
            root,
            root_path,
            scanned_at: SystemTime::now(),
            stats,
        }
    }

    /// Get the total size of the tree.
    pub fn total_size(&self) -> u64 {
        self.stats.total_size
    }

    /// Get the total number of files.
    pub fn total_files(&self) -> u64 {
        self.stats.total_files
    }

    /// Get the total number of directories.
    pub fn total_directories(&self) -> u64 {
        self.stats.total_directories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = ScanStats::new(Platform::Linux);
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.error_count, 0);
        assert!(!stats.is_partial());
    }

    #[test]
    fn test_partial_when_ignored() {
        let mut stats = ScanStats::new(Platform::Linux);
        stats.ignored_directory_count = 1;
        assert!(stats.is_partial());
    }
}

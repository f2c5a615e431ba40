//! Age-based analysis of a finished scan.
//!
//! Helps identify:
//! - how space is spread across file ages
//! - the oldest files, which are often forgotten downloads or backups
//! - stale directories whose newest file is older than a threshold
//!
//! Only materialized nodes are visited. Children dropped by truncation
//! carry no timestamps, so a directory's "newest file" is the newest file
//! that was kept.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use wheremyspace_core::{ScanNode, ScanReport};

const DAY: u64 = 24 * 60 * 60;

/// An age bucket for categorizing files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeBucket {
    /// Human-readable name for this bucket.
    pub name: String,
    /// Files at most this old fall in the bucket.
    pub max_age: Duration,
}

impl AgeBucket {
    /// Create a new age bucket.
    pub fn new(name: impl Into<String>, max_age: Duration) -> Self {
        Self {
            name: name.into(),
            max_age,
        }
    }
}

/// Configuration for age-based analysis.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct AgeConfig {
    /// Reference time for age calculations (default: now).
    #[builder(default = "SystemTime::now()")]
    pub reference_time: SystemTime,

    /// Age buckets, youngest first.
    #[builder(default = "default_buckets()")]
    pub buckets: Vec<AgeBucket>,

    /// Minimum age of the newest file for a directory to count as stale.
    #[builder(default = "Duration::from_secs(365 * DAY)")]
    pub stale_threshold: Duration,

    /// Minimum size for a stale directory to be reported.
    #[builder(default = "1024 * 1024")]
    pub min_stale_size: u64,

    /// Maximum number of stale directories to report.
    #[builder(default = "100")]
    pub max_stale_dirs: usize,

    /// Number of oldest files to report.
    #[builder(default = "20")]
    pub max_oldest_files: usize,
}

fn default_buckets() -> Vec<AgeBucket> {
    vec![
        AgeBucket::new("Today", Duration::from_secs(DAY)),
        AgeBucket::new("This Week", Duration::from_secs(7 * DAY)),
        AgeBucket::new("This Month", Duration::from_secs(30 * DAY)),
        AgeBucket::new("This Year", Duration::from_secs(365 * DAY)),
        AgeBucket::new("Older", Duration::MAX),
    ]
}

impl Default for AgeConfig {
    fn default() -> Self {
        Self {
            reference_time: SystemTime::now(),
            buckets: default_buckets(),
            stale_threshold: Duration::from_secs(365 * DAY),
            min_stale_size: 1024 * 1024,
            max_stale_dirs: 100,
            max_oldest_files: 20,
        }
    }
}

impl AgeConfig {
    /// Create a new config builder.
    pub fn builder() -> AgeConfigBuilder {
        AgeConfigBuilder::default()
    }
}

/// Totals for one age bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeBucketStats {
    pub name: String,
    pub max_age: Duration,
    pub file_count: u64,
    pub total_size: u64,
}

/// A file together with its age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgedFile {
    pub path: PathBuf,
    pub size: u64,
    pub age: Duration,
}

/// A directory whose newest file is older than the stale threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleDirectory {
    pub path: PathBuf,
    pub size: u64,
    /// Age of the newest file below the directory.
    pub newest_file_age: Duration,
    pub file_count: u64,
}

/// Results from age analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeReport {
    pub buckets: Vec<AgeBucketStats>,
    /// Oldest files first.
    pub oldest_files: Vec<AgedFile>,
    /// Largest first. Nested stale directories are folded into the
    /// outermost one.
    pub stale_directories: Vec<StaleDirectory>,
    /// Files with a known modification time.
    pub total_files: u64,
    pub total_size: u64,
    /// Files the platform reported no modification time for.
    pub undated_files: u64,
    pub average_age: Duration,
}

impl AgeReport {
    /// Check if there are any stale directories.
    pub fn has_stale_directories(&self) -> bool {
        !self.stale_directories.is_empty()
    }

    /// Get total size of stale directories.
    pub fn total_stale_size(&self) -> u64 {
        self.stale_directories.iter().map(|d| d.size).sum()
    }

    /// Get the bucket holding the most bytes.
    pub fn largest_bucket_by_size(&self) -> Option<&AgeBucketStats> {
        self.buckets.iter().max_by_key(|b| b.total_size)
    }
}

/// Age-based file analyzer.
#[derive(Debug, Default)]
pub struct AgeAnalyzer {
    config: AgeConfig,
}

impl AgeAnalyzer {
    /// Create a new analyzer with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new analyzer with custom config.
    pub fn with_config(config: AgeConfig) -> Self {
        Self { config }
    }

    /// Analyze file ages in a scan result.
    pub fn analyze(&self, report: &ScanReport) -> AgeReport {
        let mut buckets: Vec<AgeBucketStats> = self
            .config
            .buckets
            .iter()
            .map(|b| AgeBucketStats {
                name: b.name.clone(),
                max_age: b.max_age,
                file_count: 0,
                total_size: 0,
            })
            .collect();

        let mut files: Vec<AgedFile> = Vec::new();
        let mut undated_files = 0u64;

        for node in report.root.iter().filter(|n| n.is_file()) {
            let Some(age) = self.age_of(node) else {
                undated_files += 1;
                continue;
            };

            if let Some(bucket) = buckets.iter_mut().find(|b| age <= b.max_age) {
                bucket.file_count += 1;
                bucket.total_size += node.size;
            }

            files.push(AgedFile {
                path: node.path.clone(),
                size: node.size,
                age,
            });
        }

        let total_files = files.len() as u64;
        let total_size = files.iter().map(|f| f.size).sum();
        let average_age = if total_files > 0 {
            let total_secs: u128 = files.iter().map(|f| f.age.as_secs() as u128).sum();
            Duration::from_secs((total_secs / total_files as u128) as u64)
        } else {
            Duration::ZERO
        };

        files.sort_by(|a, b| b.age.cmp(&a.age).then_with(|| b.size.cmp(&a.size)));
        files.truncate(self.config.max_oldest_files);

        let mut stale_directories = Vec::new();
        self.collect_stale(&report.root, &mut stale_directories);
        stale_directories.sort_by(|a, b| b.size.cmp(&a.size));
        stale_directories.truncate(self.config.max_stale_dirs);

        debug!(
            files = total_files,
            undated = undated_files,
            stale = stale_directories.len(),
            "age analysis complete"
        );

        AgeReport {
            buckets,
            oldest_files: files,
            stale_directories,
            total_files,
            total_size,
            undated_files,
            average_age,
        }
    }

    fn age_of(&self, node: &ScanNode) -> Option<Duration> {
        let modified = node.modified?;
        Some(
            self.config
                .reference_time
                .duration_since(modified)
                .unwrap_or(Duration::ZERO),
        )
    }

    /// Post-order walk returning the newest modification time in the
    /// subtree. Stale directories found below `node` are only kept when
    /// `node` itself is not stale.
    fn collect_stale(&self, node: &ScanNode, out: &mut Vec<StaleDirectory>) -> Option<SystemTime> {
        if node.is_file() {
            return node.modified;
        }

        let mut below = Vec::new();
        let mut newest: Option<SystemTime> = None;
        for child in &node.children {
            if let Some(time) = self.collect_stale(child, &mut below) {
                newest = Some(newest.map_or(time, |n| n.max(time)));
            }
        }

        let stale_age = newest
            .map(|time| {
                self.config
                    .reference_time
                    .duration_since(time)
                    .unwrap_or(Duration::ZERO)
            })
            .filter(|age| *age >= self.config.stale_threshold);

        match stale_age {
            Some(age) if node.size >= self.config.min_stale_size && node.depth > 0 => {
                out.push(StaleDirectory {
                    path: node.path.clone(),
                    size: node.size,
                    newest_file_age: age,
                    file_count: node.file_count,
                });
            }
            _ => out.extend(below),
        }
        newest
    }
}

/// Format a duration as a human-readable age.
pub fn format_age(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < DAY {
        format!("{} hours", secs / 3600)
    } else if secs < 30 * DAY {
        format!("{} days", secs / DAY)
    } else if secs < 365 * DAY {
        format!("{} months", secs / (30 * DAY))
    } else {
        format!("{:.1} years", secs as f64 / (365 * DAY) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheremyspace_core::{Platform, ScanStats};

    fn file(path: &str, size: u64, modified: SystemTime) -> ScanNode {
        let depth = path.matches('/').count() as u32 - 1;
        ScanNode::new_file(path, size, Some(modified), depth)
    }

    fn dir(path: &str, children: Vec<ScanNode>) -> ScanNode {
        let depth = path.matches('/').count() as u32 - 1;
        let mut node = ScanNode::new_directory(path, depth);
        node.set_children(children, 100);
        node
    }

    fn report(root: ScanNode) -> ScanReport {
        let path = root.path.clone();
        ScanReport::new(root, path, ScanStats::new(Platform::Linux))
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(30)), "30 seconds");
        assert_eq!(format_age(Duration::from_secs(120)), "2 minutes");
        assert_eq!(format_age(Duration::from_secs(7200)), "2 hours");
        assert_eq!(format_age(Duration::from_secs(2 * DAY)), "2 days");
        assert_eq!(format_age(Duration::from_secs(730 * DAY)), "2.0 years");
    }

    #[test]
    fn test_default_config() {
        let config = AgeConfig::default();
        assert_eq!(config.buckets.len(), 5);
        assert_eq!(config.buckets[0].name, "Today");
        assert_eq!(config.buckets[4].name, "Older");
    }

    #[test]
    fn test_buckets_and_oldest() {
        let now = SystemTime::now();
        let old = now - Duration::from_secs(400 * DAY);
        let recent = now - Duration::from_secs(60);

        let root = dir(
            "/r",
            vec![
                file("/r/new", 10, recent),
                file("/r/old", 30, old),
                ScanNode::new_file("/r/undated", 5, None, 1),
            ],
        );

        let config = AgeConfig::builder().reference_time(now).build().unwrap();
        let result = AgeAnalyzer::with_config(config).analyze(&report(root));

        assert_eq!(result.total_files, 2);
        assert_eq!(result.undated_files, 1);
        assert_eq!(result.buckets[0].file_count, 1);
        assert_eq!(result.buckets[0].total_size, 10);
        assert_eq!(result.buckets[4].total_size, 30);
        assert_eq!(result.oldest_files[0].path, PathBuf::from("/r/old"));
        assert_eq!(result.largest_bucket_by_size().unwrap().name, "Older");
    }

    #[test]
    fn test_stale_directories_fold_into_outermost() {
        let now = SystemTime::now();
        let old = now - Duration::from_secs(800 * DAY);

        let inner = dir("/r/archive/2019", vec![file("/r/archive/2019/a", 2_000_000, old)]);
        let archive = dir("/r/archive", vec![inner, file("/r/archive/b", 1_000_000, old)]);
        let live = dir("/r/live", vec![file("/r/live/c", 5_000_000, now)]);
        let root = dir("/r", vec![archive, live]);

        let config = AgeConfig::builder().reference_time(now).build().unwrap();
        let result = AgeAnalyzer::with_config(config).analyze(&report(root));

        assert_eq!(result.stale_directories.len(), 1);
        assert_eq!(result.stale_directories[0].path, PathBuf::from("/r/archive"));
        assert_eq!(result.stale_directories[0].size, 3_000_000);
        assert_eq!(result.total_stale_size(), 3_000_000);
    }
}

//! Largest items and size filtering.
//!
//! Works over the materialized tree, so results are exact for anything
//! large enough to survive per-directory truncation.

use serde::{Deserialize, Serialize};

use wheremyspace_core::{ScanNode, ScanReport, compare_by_size};

/// Which nodes to consider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemFilter {
    #[default]
    All,
    Files,
    Directories,
}

impl ItemFilter {
    fn accepts(&self, node: &ScanNode) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Files => node.is_file(),
            ItemFilter::Directories => node.is_dir(),
        }
    }
}

fn candidates(report: &ScanReport, filter: ItemFilter) -> impl Iterator<Item = &ScanNode> {
    // The root is the whole scan, never an item of it.
    report.root.iter().skip(1).filter(move |n| filter.accepts(n))
}

/// The `n` largest items below the root, largest first.
pub fn largest_items(report: &ScanReport, n: usize, filter: ItemFilter) -> Vec<&ScanNode> {
    let mut items: Vec<&ScanNode> = candidates(report, filter).collect();
    items.sort_by(|a, b| compare_by_size(a, b));
    items.truncate(n);
    items
}

/// Files of at least `min_size` bytes, largest first.
pub fn items_at_least(report: &ScanReport, min_size: u64) -> Vec<&ScanNode> {
    let mut items: Vec<&ScanNode> = candidates(report, ItemFilter::Files)
        .filter(|n| n.size >= min_size)
        .collect();
    items.sort_by(|a, b| compare_by_size(a, b));
    items
}

/// Number of files of at least `min_size` bytes.
pub fn count_at_least(report: &ScanReport, min_size: u64) -> u64 {
    candidates(report, ItemFilter::Files)
        .filter(|n| n.size >= min_size)
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheremyspace_core::{Platform, ScanStats};

    fn sample() -> ScanReport {
        let mut videos = ScanNode::new_directory("/r/videos", 1);
        videos.set_children(
            vec![
                ScanNode::new_file("/r/videos/a.mp4", 500, None, 2),
                ScanNode::new_file("/r/videos/b.mp4", 300, None, 2),
            ],
            100,
        );
        let mut root = ScanNode::new_directory("/r", 0);
        root.set_children(
            vec![videos, ScanNode::new_file("/r/notes.txt", 40, None, 1)],
            100,
        );
        ScanReport::new(root, "/r".into(), ScanStats::new(Platform::Linux))
    }

    #[test]
    fn test_largest_items_all() {
        let report = sample();
        let names: Vec<_> = largest_items(&report, 3, ItemFilter::All)
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["videos", "a.mp4", "b.mp4"]);
    }

    #[test]
    fn test_largest_files_only() {
        let report = sample();
        let items = largest_items(&report, 10, ItemFilter::Files);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|n| n.is_file()));
    }

    #[test]
    fn test_min_size() {
        let report = sample();
        assert_eq!(count_at_least(&report, 300), 2);
        assert_eq!(count_at_least(&report, 0), 3);
        let items = items_at_least(&report, 301);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].size, 500);
    }
}

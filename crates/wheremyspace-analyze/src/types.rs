//! Breakdown of used space by file type.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use wheremyspace_core::ScanReport;

/// Coarse file category, derived from the extension. Iteration follows
/// display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Videos,
    Images,
    Documents,
    Applications,
    Archives,
    Other,
}

impl FileCategory {
    /// Categorize a path by its extension, case-insensitively.
    pub fn of(path: &Path) -> Self {
        let Some(ext) = path.extension() else {
            return FileCategory::Other;
        };
        match ext.to_string_lossy().to_ascii_lowercase().as_str() {
            "mp4" | "avi" | "mkv" | "mov" | "wmv" | "webm" | "m4v" => FileCategory::Videos,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "heic" | "tiff" => {
                FileCategory::Images
            }
            "pdf" | "doc" | "docx" | "txt" | "odt" | "xls" | "xlsx" | "ppt" | "pptx" | "md" => {
                FileCategory::Documents
            }
            "exe" | "msi" | "app" | "dmg" | "pkg" | "deb" | "rpm" | "appimage" => {
                FileCategory::Applications
            }
            "zip" | "tar" | "gz" | "tgz" | "bz2" | "xz" | "7z" | "rar" | "zst" => {
                FileCategory::Archives
            }
            _ => FileCategory::Other,
        }
    }
}

/// Totals for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: FileCategory,
    pub file_count: u64,
    pub total_size: u64,
}

/// Space used per [`FileCategory`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeBreakdown {
    /// One entry per category, largest first.
    pub categories: Vec<CategoryStats>,
    /// Bytes in files dropped by truncation, which cannot be categorized.
    pub uncategorized_size: u64,
    /// Total size of the scan.
    pub total_size: u64,
}

impl TypeBreakdown {
    /// Categorize every materialized file of a scan.
    pub fn from_report(report: &ScanReport) -> Self {
        let mut categories: Vec<CategoryStats> = FileCategory::iter()
            .map(|category| CategoryStats {
                category,
                file_count: 0,
                total_size: 0,
            })
            .collect();

        let mut categorized = 0u64;
        for node in report.root.iter().filter(|n| n.is_file()) {
            let category = FileCategory::of(&node.path);
            if let Some(stats) = categories.iter_mut().find(|s| s.category == category) {
                stats.file_count += 1;
                stats.total_size += node.size;
            }
            categorized = categorized.saturating_add(node.size);
        }

        categories.sort_by(|a, b| b.total_size.cmp(&a.total_size));

        Self {
            categories,
            uncategorized_size: report.root.size.saturating_sub(categorized),
            total_size: report.root.size,
        }
    }

    /// Share of the total taken by a category, in percent.
    pub fn percent(&self, category: FileCategory) -> f64 {
        if self.total_size == 0 {
            return 0.0;
        }
        let size = self
            .categories
            .iter()
            .find(|s| s.category == category)
            .map_or(0, |s| s.total_size);
        size as f64 / self.total_size as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheremyspace_core::{Platform, ScanNode, ScanStats};

    #[test]
    fn test_category_of() {
        assert_eq!(FileCategory::of(Path::new("/a/movie.MKV")), FileCategory::Videos);
        assert_eq!(FileCategory::of(Path::new("/a/photo.jpeg")), FileCategory::Images);
        assert_eq!(FileCategory::of(Path::new("/a/setup.msi")), FileCategory::Applications);
        assert_eq!(FileCategory::of(Path::new("/a/backup.tar")), FileCategory::Archives);
        assert_eq!(FileCategory::of(Path::new("/a/Makefile")), FileCategory::Other);
    }

    #[test]
    fn test_category_names() {
        let names: Vec<String> = FileCategory::iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec!["Videos", "Images", "Documents", "Applications", "Archives", "Other"]
        );
        assert_eq!(
            serde_json::to_value(FileCategory::Applications).unwrap(),
            "applications"
        );
    }

    #[test]
    fn test_breakdown_accounts_for_truncation() {
        let mut root = ScanNode::new_directory("/r", 0);
        root.set_children(
            vec![
                ScanNode::new_file("/r/a.mp4", 600, None, 1),
                ScanNode::new_file("/r/b.pdf", 300, None, 1),
                ScanNode::new_file("/r/c.pdf", 100, None, 1),
            ],
            2,
        );
        let report = ScanReport::new(root, "/r".into(), ScanStats::new(Platform::Linux));

        let breakdown = TypeBreakdown::from_report(&report);
        assert_eq!(breakdown.categories[0].category, FileCategory::Videos);
        assert_eq!(breakdown.categories[1].category, FileCategory::Documents);
        assert_eq!(breakdown.categories[1].file_count, 1);
        assert_eq!(breakdown.uncategorized_size, 100);
        assert_eq!(breakdown.percent(FileCategory::Videos), 60.0);
    }
}

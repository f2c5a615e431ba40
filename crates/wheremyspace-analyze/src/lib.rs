//! Analysis of finished scans for wheremyspace.
//!
//! Everything here is read-only over a [`ScanReport`] and never touches
//! the filesystem:
//!
//! - **Largest items** - biggest files and directories, minimum-size filters
//! - **File types** - space per category (videos, images, documents, ...)
//! - **Age analysis** - age buckets, oldest files, stale directories
//!
//! ```rust,ignore
//! use wheremyspace_analyze::{AgeAnalyzer, ItemFilter, TypeBreakdown, largest_items};
//! use wheremyspace_scan::{ScanConfig, ScanController, ScanEvent};
//!
//! let controller = ScanController::new(ScanConfig::new("/path/to/scan"));
//! let report = controller.run(&|_event: ScanEvent| {}).unwrap();
//!
//! for item in largest_items(&report, 10, ItemFilter::Files) {
//!     println!("{} {}", item.size, item.path.display());
//! }
//!
//! let types = TypeBreakdown::from_report(&report);
//! let ages = AgeAnalyzer::new().analyze(&report);
//! println!("{} stale directories", ages.stale_directories.len());
//! ```

pub mod age;
mod largest;
mod types;

pub use age::{
    AgeAnalyzer, AgeBucket, AgeBucketStats, AgeConfig, AgeReport, AgedFile, StaleDirectory,
    format_age,
};
pub use largest::{ItemFilter, count_at_least, items_at_least, largest_items};
pub use types::{CategoryStats, FileCategory, TypeBreakdown};

// Re-export core types
pub use wheremyspace_core::{ScanNode, ScanReport};

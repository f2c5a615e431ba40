use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use wheremyspace_analyze::{
    AgeAnalyzer, AgeConfig, FileCategory, ItemFilter, TypeBreakdown, count_at_least,
    largest_items,
};
use wheremyspace_scan::{ScanConfig, ScanController, ScanEvent, ScanReport};

fn scan(temp: &TempDir) -> Arc<ScanReport> {
    ScanController::new(ScanConfig::new(temp.path()))
        .run(&|_event: ScanEvent| {})
        .unwrap()
}

fn create_media_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir(root.join("movies")).unwrap();
    fs::create_dir(root.join("docs")).unwrap();
    fs::write(root.join("movies/trip.mp4"), vec![0u8; 4000]).unwrap();
    fs::write(root.join("movies/cover.png"), vec![0u8; 500]).unwrap();
    fs::write(root.join("docs/report.pdf"), vec![0u8; 1200]).unwrap();
    fs::write(root.join("docs/notes.txt"), vec![0u8; 30]).unwrap();
    fs::write(root.join("backup.zip"), vec![0u8; 2500]).unwrap();

    temp
}

#[test]
fn test_largest_files_across_tree() {
    let temp = create_media_tree();
    let report = scan(&temp);

    let names: Vec<_> = largest_items(&report, 3, ItemFilter::Files)
        .iter()
        .map(|n| n.name.to_string())
        .collect();
    assert_eq!(names, vec!["trip.mp4", "backup.zip", "report.pdf"]);

    let dirs = largest_items(&report, 10, ItemFilter::Directories);
    assert_eq!(dirs.len(), 2);
    assert_eq!(dirs[0].name.as_str(), "movies");
    assert_eq!(dirs[0].size, 4500);
}

#[test]
fn test_count_at_least() {
    let temp = create_media_tree();
    let report = scan(&temp);

    assert_eq!(count_at_least(&report, 1000), 3);
    assert_eq!(count_at_least(&report, 1), 5);
}

#[test]
fn test_type_breakdown_from_scan() {
    let temp = create_media_tree();
    let report = scan(&temp);

    let breakdown = TypeBreakdown::from_report(&report);
    assert_eq!(breakdown.total_size, 8230);
    assert_eq!(breakdown.uncategorized_size, 0);
    assert_eq!(breakdown.categories[0].category, FileCategory::Videos);
    assert_eq!(breakdown.categories[1].category, FileCategory::Archives);

    let docs = breakdown
        .categories
        .iter()
        .find(|c| c.category == FileCategory::Documents)
        .unwrap();
    assert_eq!(docs.file_count, 2);
    assert_eq!(docs.total_size, 1230);
}

#[test]
fn test_fresh_files_are_not_stale() {
    let temp = create_media_tree();
    let report = scan(&temp);

    let config = AgeConfig::builder()
        .reference_time(SystemTime::now() + Duration::from_secs(60))
        .min_stale_size(0u64)
        .build()
        .unwrap();
    let ages = AgeAnalyzer::with_config(config).analyze(&report);

    assert_eq!(ages.total_files + ages.undated_files, 5);
    assert!(!ages.has_stale_directories());
    assert_eq!(ages.buckets[0].name, "Today");
    assert_eq!(ages.buckets[0].file_count, ages.total_files);
}

//! Suggested scan roots for the host.

#[cfg(not(windows))]
use std::fs;
#[cfg(not(windows))]
use std::path::Path;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What a suggested root represents. Purely a display label; the scan
/// itself is identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A drive or mounted volume.
    Volume,
    /// A folder such as the user's home.
    Folder,
}

/// A root the host may offer for scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    pub path: PathBuf,
    pub kind: TargetKind,
    pub label: String,
}

impl ScanTarget {
    fn new(path: impl Into<PathBuf>, kind: TargetKind) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, kind, label }
    }
}

/// Directories that typically hold mount points.
#[cfg(not(windows))]
const MOUNT_PARENTS: &[&str] = &["/mnt", "/media", "/Volumes"];

/// Existing drives and volumes plus the user's home directory.
#[cfg(windows)]
pub fn suggest_targets() -> Vec<ScanTarget> {
    let mut targets: Vec<ScanTarget> = (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|drive| drive.exists())
        .map(|drive| ScanTarget::new(drive, TargetKind::Volume))
        .collect();

    if let Some(home) = home_dir() {
        targets.push(ScanTarget::new(home, TargetKind::Folder));
    }
    targets
}

/// Existing drives and volumes plus the user's home directory.
#[cfg(not(windows))]
pub fn suggest_targets() -> Vec<ScanTarget> {
    let mut targets = vec![ScanTarget::new("/", TargetKind::Volume)];

    for parent in MOUNT_PARENTS {
        targets.extend(
            mounted_under(Path::new(parent))
                .into_iter()
                .map(|path| ScanTarget::new(path, TargetKind::Volume)),
        );
    }

    if let Some(home) = home_dir() {
        targets.push(ScanTarget::new(home, TargetKind::Folder));
    }

    let mut seen = std::collections::HashSet::new();
    targets.retain(|t| seen.insert(t.path.clone()));
    targets
}

/// Subdirectories of a mount parent, sorted by path. Unreadable or missing
/// parents yield nothing.
#[cfg(not(windows))]
fn mounted_under(parent: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(parent) else {
        return Vec::new();
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir() || t.is_symlink()))
        .map(|entry| entry.path())
        .filter(|path| fs::metadata(path).is_ok_and(|m| m.is_dir()))
        .collect();
    found.sort();
    found
}

fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().filter(|home| home.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_label() {
        let target = ScanTarget::new("/mnt/backup", TargetKind::Volume);
        assert_eq!(target.label, "backup");

        let root = ScanTarget::new("/", TargetKind::Volume);
        assert_eq!(root.label, "/");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_mounted_under_lists_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::create_dir(temp.path().join("disk2")).unwrap();
        fs::create_dir(temp.path().join("disk1")).unwrap();
        fs::write(temp.path().join("note.txt"), "x").unwrap();

        let found = mounted_under(temp.path());
        assert_eq!(
            found,
            vec![temp.path().join("disk1"), temp.path().join("disk2")]
        );
        assert!(mounted_under(&temp.path().join("missing")).is_empty());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_suggest_targets_starts_with_root() {
        let targets = suggest_targets();
        assert_eq!(targets[0].path, PathBuf::from("/"));
        assert_eq!(targets[0].kind, TargetKind::Volume);
    }

    #[test]
    fn test_home_is_suggested() {
        let Some(home) = dirs::home_dir().filter(|home| home.is_dir()) else {
            return;
        };
        let targets = suggest_targets();
        // A home of "/" is deduplicated into the root volume.
        assert!(targets.iter().any(|t| t.path == home));
    }
}

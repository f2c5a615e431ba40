//! Directory identity tracking for symlink cycle detection.

use std::fs::Metadata;

use dashmap::DashSet;

/// Identity of a directory on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirId {
    /// Device ID.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
}

impl DirId {
    /// Create a new directory identity.
    pub fn new(device: u64, inode: u64) -> Self {
        Self { device, inode }
    }

    /// Identity from followed metadata, where the platform exposes one.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self::new(metadata.dev(), metadata.ino()))
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// Tracks directories already entered while following symlinks.
///
/// Uses a concurrent set so sibling subtrees scanned on different workers
/// share one view of what has been visited.
#[derive(Debug, Default)]
pub struct VisitedDirs {
    seen: DashSet<DirId>,
}

impl VisitedDirs {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Track a directory. Returns `true` the first time it is seen.
    pub fn track(&self, id: DirId) -> bool {
        self.seen.insert(id)
    }

    /// Get the number of directories tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if nothing has been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

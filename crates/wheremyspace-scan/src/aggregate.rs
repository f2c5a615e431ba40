//! Recursive fan-out/fan-in directory aggregation.
//!
//! Each directory lists its entries, scans them in parallel on the current
//! rayon pool and only aggregates once every child subtree has returned.
//! Failures below the root are recovered locally: an unreadable entry is
//! left out of its parent, an unreadable directory becomes an empty node.
//!
//! Listings are copied into owned [`Entry`] values and the directory handle
//! is closed before recursing, so open descriptors do not grow with depth.
//! Every listed entry is reported to the progress estimator exactly once,
//! as soon as its own subtree is done.

use std::fs::{self, FileType, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use wheremyspace_core::{FailureKind, FailureScope, ScanError, ScanNode};

use crate::context::ScanContext;
use crate::visited::DirId;

/// Builds the size-aggregated [`ScanNode`] tree.
pub(crate) struct TreeAggregator<'a, 'c> {
    ctx: &'c ScanContext<'a>,
}

impl<'a, 'c> TreeAggregator<'a, 'c> {
    pub fn new(ctx: &'c ScanContext<'a>) -> Self {
        Self { ctx }
    }

    /// Scan the root. It is never treated as protected, and failing to
    /// list it ends the scan.
    pub fn scan_root(&self, root: &Path) -> Result<ScanNode, ScanError> {
        let entries = self.list(root).map_err(|e| ScanError::io(root, e))?;
        Ok(self.build_directory(root, 0, entries))
    }

    /// Scan a directory below the root.
    ///
    /// Returns `None` when the directory must not appear in its parent's
    /// children: protected, too deep, already visited, or cancelled.
    pub fn scan_directory(&self, path: &Path, depth: u32, linked: bool) -> Option<ScanNode> {
        if self.ctx.is_cancelled() {
            return None;
        }

        if self.ctx.errors.paths().is_protected(path) {
            self.ctx.skip(path, FailureKind::ProtectedPathSkipped);
            return None;
        }

        if depth > self.ctx.config.max_depth {
            self.ctx.skip(path, FailureKind::DepthLimitReached);
            return None;
        }

        if self.ctx.config.follow_symlinks && !self.first_visit(path, linked) {
            self.ctx.skip(path, FailureKind::CycleSkipped);
            return None;
        }

        match self.list(path) {
            Ok(entries) => Some(self.build_directory(path, depth, entries)),
            Err(err) => {
                self.ctx.failure(&err, path, FailureScope::Directory);
                Some(ScanNode::new_directory(path, depth))
            }
        }
    }

    fn build_directory(&self, path: &Path, depth: u32, entries: Vec<Entry>) -> ScanNode {
        let children: Vec<ScanNode> = entries
            .into_par_iter()
            .filter_map(|entry| {
                let node = self.visit_entry(&entry, depth + 1);
                self.ctx.processed(1, &entry.path);
                node
            })
            .collect();

        let mut node = ScanNode::new_directory(path, depth);
        node.set_children(children, self.ctx.config.max_children);
        node
    }

    fn visit_entry(&self, entry: &Entry, depth: u32) -> Option<ScanNode> {
        if self.ctx.is_cancelled() {
            return None;
        }

        let path = &entry.path;
        let file_type = match &entry.file_type {
            Ok(file_type) => *file_type,
            Err(err) => {
                self.ctx.failure(err, path, FailureScope::Entry);
                return None;
            }
        };

        if file_type.is_dir() {
            self.scan_directory(path, depth, false)
        } else if file_type.is_file() {
            match fs::symlink_metadata(path) {
                Ok(metadata) => Some(file_node(path.clone(), &metadata, depth)),
                Err(err) => {
                    self.ctx.failure(&err, path, FailureScope::Entry);
                    None
                }
            }
        } else if file_type.is_symlink() && self.ctx.config.follow_symlinks {
            self.follow(path.clone(), depth)
        } else {
            // Unfollowed symlinks, sockets, fifos, devices.
            None
        }
    }

    fn follow(&self, path: PathBuf, depth: u32) -> Option<ScanNode> {
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) => {
                self.ctx.failure(&err, &path, FailureScope::Entry);
                return None;
            }
        };

        if metadata.is_dir() {
            self.scan_directory(&path, depth, true)
        } else if metadata.is_file() {
            Some(file_node(path, &metadata, depth))
        } else {
            None
        }
    }

    /// Record a directory as visited. Linked directories whose identity
    /// cannot be determined are treated as already seen.
    fn first_visit(&self, path: &Path, linked: bool) -> bool {
        let id = fs::metadata(path)
            .ok()
            .and_then(|metadata| DirId::from_metadata(&metadata));
        match id {
            Some(id) => self.ctx.visited.track(id),
            None => !linked,
        }
    }

    /// Read a whole directory. The handle is closed when this returns.
    fn list(&self, path: &Path) -> io::Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            match entry {
                Ok(entry) => entries.push(Entry {
                    file_type: entry.file_type(),
                    path: entry.path(),
                }),
                Err(err) => self.ctx.failure(&err, path, FailureScope::Entry),
            }
        }
        Ok(entries)
    }
}

/// A listed directory entry that no longer borrows the directory handle.
struct Entry {
    path: PathBuf,
    file_type: io::Result<FileType>,
}

fn file_node(path: PathBuf, metadata: &Metadata, depth: u32) -> ScanNode {
    ScanNode::new_file(path, metadata.len(), metadata.modified().ok(), depth)
}

//! File and directory node types.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Type of result node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }
}

/// A single file or directory in the result tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanNode {
    /// Display name (base name of the path).
    pub name: CompactString,

    /// Absolute path, unique within one scan.
    pub path: PathBuf,

    /// Node type.
    pub kind: NodeKind,

    /// Size in bytes. For directories this is the sum over every
    /// descendant, including children dropped by truncation.
    pub size: u64,

    /// Number of files in this subtree (1 for a file).
    pub file_count: u64,

    /// Number of directories below this node.
    #[serde(default)]
    pub dir_count: u64,

    /// Last modification time (files only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<SystemTime>,

    /// Children sorted by size descending, then name ascending.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ScanNode>,

    /// How many children were dropped from `children` by truncation.
    #[serde(default)]
    pub pruned_children: u64,

    /// Distance from the scan root.
    pub depth: u32,
}

impl ScanNode {
    /// Create a new file node.
    pub fn new_file(
        path: impl Into<PathBuf>,
        size: u64,
        modified: Option<SystemTime>,
        depth: u32,
    ) -> Self {
        let path = path.into();
        Self {
            name: display_name(&path),
            path,
            kind: NodeKind::File,
            size,
            file_count: 1,
            dir_count: 0,
            modified,
            children: Vec::new(),
            pruned_children: 0,
            depth,
        }
    }

    /// Create a new, empty directory node.
    pub fn new_directory(path: impl Into<PathBuf>, depth: u32) -> Self {
        let path = path.into();
        Self {
            name: display_name(&path),
            path,
            kind: NodeKind::Directory,
            size: 0,
            file_count: 0,
            dir_count: 0,
            modified: None,
            children: Vec::new(),
            pruned_children: 0,
            depth,
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Get the number of materialized children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Attach the complete set of scanned children to a directory.
    ///
    /// Totals are summed over all of `children` first; only then are they
    /// sorted and cut down to `max_children`, so truncation never changes
    /// the aggregate numbers.
    pub fn set_children(&mut self, mut children: Vec<ScanNode>, max_children: usize) {
        let mut size: u64 = 0;
        let mut file_count: u64 = 0;
        let mut dir_count: u64 = 0;

        for child in &children {
            size = size.saturating_add(child.size);
            file_count += child.file_count;
            if child.is_dir() {
                dir_count += child.dir_count + 1;
            }
        }

        self.size = size;
        self.file_count = file_count;
        self.dir_count = dir_count;

        children.sort_by(compare_by_size);
        let pruned = children.len().saturating_sub(max_children);
        children.truncate(max_children);

        self.pruned_children = pruned as u64;
        self.children = children;
    }

    /// Iterate over this node and every materialized descendant, depth-first.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }
}

/// Pre-order iterator over a node and its materialized descendants.
pub struct NodeIter<'a> {
    stack: Vec<&'a ScanNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a ScanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Result-tree ordering: size descending, ties by name ascending.
pub fn compare_by_size(a: &ScanNode, b: &ScanNode) -> Ordering {
    b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name))
}

/// Base name of a path, or the whole path for roots like `/` or `C:\`.
fn display_name(path: &Path) -> CompactString {
    match path.file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => CompactString::new(path.to_string_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64) -> ScanNode {
        ScanNode::new_file(PathBuf::from("/scan").join(name), size, None, 1)
    }

    #[test]
    fn test_file_node_creation() {
        let node = file("test.txt", 1024);
        assert!(node.is_file());
        assert!(!node.is_dir());
        assert_eq!(node.name.as_str(), "test.txt");
        assert_eq!(node.file_count, 1);
        assert_eq!(node.child_count(), 0);
    }

    #[test]
    fn test_root_display_name() {
        let node = ScanNode::new_directory("/", 0);
        assert_eq!(node.name.as_str(), "/");
    }

    #[test]
    fn test_set_children_sorts_with_name_tiebreak() {
        let mut dir = ScanNode::new_directory("/scan", 0);
        dir.set_children(vec![file("b", 10), file("a", 10), file("c", 30)], 100);

        let names: Vec<_> = dir.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(dir.size, 50);
        assert_eq!(dir.file_count, 3);
        assert_eq!(dir.pruned_children, 0);
    }

    #[test]
    fn test_truncation_keeps_totals() {
        let mut dir = ScanNode::new_directory("/scan", 0);
        let children = (1..=10).map(|i| file(&format!("f{i:02}"), i)).collect();
        dir.set_children(children, 3);

        assert_eq!(dir.child_count(), 3);
        assert_eq!(dir.pruned_children, 7);
        assert_eq!(dir.size, 55);
        assert_eq!(dir.file_count, 10);
        let sizes: Vec<_> = dir.children.iter().map(|c| c.size).collect();
        assert_eq!(sizes, vec![10, 9, 8]);
    }

    #[test]
    fn test_iter_is_preorder() {
        let mut sub = ScanNode::new_directory("/scan/sub", 1);
        sub.set_children(vec![file("sub/x", 4)], 100);
        let mut root = ScanNode::new_directory("/scan", 0);
        root.set_children(vec![sub, file("y", 1)], 100);

        let names: Vec<_> = root.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["scan", "sub", "x", "y"]);
        assert_eq!(root.dir_count, 1);
    }
}

//! Per-node view of a cache entry handed to the policy.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A visited node of the cache tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Final path segment (lossy for non-UTF-8 names).
    pub basename: String,
    /// Containing directory; empty only for a bare root.
    pub parent: PathBuf,
    /// Whether the entry is a directory (symlinks are not followed).
    pub is_dir: bool,
    /// Resolved last-access time, `None` when unresolvable.
    pub last_access: Option<SystemTime>,
}

impl CacheEntry {
    /// Build an entry, deriving basename and parent from `path`.
    pub fn new(path: impl Into<PathBuf>, is_dir: bool, last_access: Option<SystemTime>) -> Self {
        let path = path.into();
        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            basename,
            parent,
            is_dir,
            last_access,
        }
    }

    /// Convenience for a file entry.
    pub fn file(path: impl Into<PathBuf>, last_access: Option<SystemTime>) -> Self {
        Self::new(path, false, last_access)
    }

    /// Convenience for a directory entry.
    pub fn dir(path: impl Into<PathBuf>, last_access: Option<SystemTime>) -> Self {
        Self::new(path, true, last_access)
    }
}

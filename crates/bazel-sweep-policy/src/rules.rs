//! Static protection rules.
//!
//! The defaults describe the layout of a Bazel output user root: the install
//! base and embedded tools must never be touched, `external/` is only purged
//! selectively, and `lock` guards the server.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::decision::Protection;
use crate::entry::CacheEntry;

/// Name of Bazel's server lock file.
pub const LOCK_FILE: &str = "lock";

/// Directory names that are never deleted.
pub const DEFAULT_PROTECTED_DIRECTORIES: &[&str] = &["install", "embedded_tools", "external"];

/// Parent path segments that mark Bazel internals.
pub const DEFAULT_STRUCTURAL_MARKERS: &[&str] = &["embedded_tools", "install"];

/// The only direct child of the root that is not structurally protected.
pub const DEFAULT_WORKING_CACHE: &str = "cache";

/// Protection applied to stale entries, independent of the reference set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProtectionRules {
    /// File basenames that are never deleted.
    pub files: BTreeSet<String>,

    /// Directory basenames that are never deleted.
    pub directories: BTreeSet<String>,

    /// Substrings that protect an entry when any parent segment below the
    /// root contains them.
    pub structural_markers: Vec<String>,

    /// Direct children of the root other than this one are protected.
    /// `None` disables the rule.
    pub working_cache: Option<String>,

    /// When false, stale directories are descended instead of deleted.
    pub delete_directories: bool,
}

impl Default for ProtectionRules {
    fn default() -> Self {
        Self {
            files: [LOCK_FILE].iter().map(|s| s.to_string()).collect(),
            directories: DEFAULT_PROTECTED_DIRECTORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            structural_markers: DEFAULT_STRUCTURAL_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            working_cache: Some(DEFAULT_WORKING_CACHE.to_string()),
            delete_directories: true,
        }
    }
}

impl ProtectionRules {
    /// No static protection at all.
    pub fn none() -> Self {
        Self {
            files: BTreeSet::new(),
            directories: BTreeSet::new(),
            structural_markers: Vec::new(),
            working_cache: None,
            delete_directories: true,
        }
    }

    /// Plain age-based file sweep: nothing protected, directories kept.
    pub fn files_only() -> Self {
        Self {
            delete_directories: false,
            ..Self::none()
        }
    }

    /// Protection by basename, matched per entry kind.
    pub fn basename_protection(&self, entry: &CacheEntry) -> Option<Protection> {
        if entry.is_dir {
            self.directories
                .contains(&entry.basename)
                .then(|| Protection::ProtectedDirectory(entry.basename.clone()))
        } else {
            self.files
                .contains(&entry.basename)
                .then(|| Protection::ProtectedFile(entry.basename.clone()))
        }
    }

    /// Protection granted by where the entry sits relative to `root`.
    pub fn structural_protection(&self, entry: &CacheEntry, root: &Path) -> Option<Protection> {
        if let Ok(relative) = entry.parent.strip_prefix(root) {
            for component in relative.components() {
                let Component::Normal(segment) = component else {
                    continue;
                };
                let segment = segment.to_string_lossy();
                if let Some(marker) = self
                    .structural_markers
                    .iter()
                    .find(|marker| segment.contains(marker.as_str()))
                {
                    return Some(Protection::StructuralMarker(marker.clone()));
                }
            }
        }

        match &self.working_cache {
            Some(working) if entry.parent == root && entry.basename != *working => {
                Some(Protection::RootChild)
            }
            _ => None,
        }
    }
}

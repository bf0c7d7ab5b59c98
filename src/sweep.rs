//! Depth-first sweep of the cache tree.
//!
//! Every visited node is stat'ed, turned into a [`CacheEntry`] and classified.
//! `Delete` records the path and stops descent, `PruneSubtree` stops descent
//! without recording, everything else descends. The walk fails on the first
//! traversal error and the partial deletion set is dropped with it.

use std::fs::{self, Metadata};
use std::io;
use std::path::{Component, Path, PathBuf};

use bazel_sweep_policy::{
    resolve_access_time, CacheEntry, Decision, RetentionPolicy, SkipReason, StatRecord,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{SweepError, SweepResult};

/// Paths selected for removal, in walk order.
///
/// Append-only while walking; consumed once by the removal phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeletionSet {
    paths: Vec<PathBuf>,
}

impl DeletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths
    }
}

impl FromIterator<PathBuf> for DeletionSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

/// Counters collected during one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    /// Entries stat'ed and classified
    pub visited: usize,
    /// Entries selected for removal
    pub selected: usize,
    /// Stale entries kept by a protection rule
    pub protected: usize,
    /// Referenced directories whose subtree was skipped
    pub pruned: usize,
    /// Entries inside the retention window
    pub recent: usize,
    /// Entries whose access time could not be resolved
    pub unresolved: usize,
    /// Stale directories kept because directory deletion is off
    pub retained_dirs: usize,
}

impl SweepStats {
    fn record(&mut self, decision: &Decision) {
        self.visited += 1;
        match decision {
            Decision::Delete => self.selected += 1,
            Decision::Protect { .. } => self.protected += 1,
            Decision::PruneSubtree => self.pruned += 1,
            Decision::SkipToContinue { reason } => match reason {
                SkipReason::CacheRoot => {}
                SkipReason::Recent => self.recent += 1,
                SkipReason::AccessTimeUnknown => self.unresolved += 1,
                SkipReason::DirectoryRetained => self.retained_dirs += 1,
            },
        }
    }
}

/// Outcome of a successful walk.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub deletion_set: DeletionSet,
    pub stats: SweepStats,
}

/// Build the policy's view of `path` from its (non-following) metadata.
pub fn entry_from_metadata(path: &Path, metadata: &Metadata) -> CacheEntry {
    let record = StatRecord::from_metadata(metadata);
    CacheEntry::new(path, metadata.is_dir(), resolve_access_time(&record))
}

/// Walks the cache root and applies a [`RetentionPolicy`] to every node.
pub struct CacheSweeper<'a> {
    policy: &'a RetentionPolicy,
}

impl<'a> CacheSweeper<'a> {
    pub fn new(policy: &'a RetentionPolicy) -> Self {
        Self { policy }
    }

    /// Walk the whole tree and return the deletion set.
    pub fn sweep(&self) -> SweepResult<SweepReport> {
        let root = self.policy.cache_root();
        let mut deletion_set = DeletionSet::new();
        let mut stats = SweepStats::default();

        info!(root = %root.display(), retention_secs = self.policy.retention().as_secs(), "sweeping cache");

        // No sorter: sorting reads each directory before its entry is yielded,
        // which would refresh directory access times under relatime.
        let mut walker = WalkDir::new(root).follow_links(false).into_iter();
        while let Some(next) = walker.next() {
            let dent = next.map_err(|source| walk_error(root, source))?;
            let metadata = dent.metadata().map_err(|source| walk_error(root, source))?;
            let entry = entry_from_metadata(dent.path(), &metadata);

            let decision = self.policy.classify(&entry);
            stats.record(&decision);
            match &decision {
                Decision::Delete => {
                    debug!(path = %entry.path.display(), "adding path to remove");
                }
                Decision::PruneSubtree => {
                    debug!(path = %entry.path.display(), "skipping active target");
                }
                Decision::Protect { reason } => {
                    debug!(path = %entry.path.display(), reason = %reason.to_code(), "skipping protected path");
                }
                Decision::SkipToContinue { reason } => {
                    if *reason == SkipReason::AccessTimeUnknown {
                        debug!(path = %entry.path.display(), "access time unavailable");
                    }
                }
            }

            if entry.is_dir && !decision.descends() {
                walker.skip_current_dir();
            }
            if decision.is_delete() {
                deletion_set.push(entry.path);
            }
        }

        if stats.unresolved > 0 {
            warn!(
                count = stats.unresolved,
                "access time unavailable for some entries; they were kept"
            );
        }
        info!(
            visited = stats.visited,
            selected = stats.selected,
            protected = stats.protected,
            pruned = stats.pruned,
            "sweep complete"
        );

        Ok(SweepReport {
            deletion_set,
            stats,
        })
    }

    /// Classify a single path without walking or deleting anything.
    ///
    /// `..` components are rejected outright; the prefix check is lexical.
    pub fn inspect(&self, path: &Path) -> SweepResult<(CacheEntry, Decision)> {
        let root = self.policy.cache_root();
        let has_parent_dir = path.components().any(|c| c == Component::ParentDir);
        if has_parent_dir || !path.starts_with(root) {
            return Err(SweepError::OutsideRoot {
                path: path.to_path_buf(),
                root: root.to_path_buf(),
            });
        }
        let metadata = fs::symlink_metadata(path).map_err(|source| SweepError::Walk {
            path: path.to_path_buf(),
            source,
        })?;
        let entry = entry_from_metadata(path, &metadata);
        let decision = self.policy.classify(&entry);
        Ok((entry, decision))
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> SweepError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    SweepError::Walk {
        path,
        source: io::Error::from(err),
    }
}

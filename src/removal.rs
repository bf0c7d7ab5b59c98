//! Removal phase.
//!
//! Runs only after a complete walk. Removals happen in walk order and stop at
//! the first failure: the sweep is not transactional, so the error reports
//! how many paths were already gone.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{SweepError, SweepResult};
use crate::signal::SignalState;
use crate::sweep::DeletionSet;

/// Recursive-remove primitive.
pub trait Remover {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Removes from the local filesystem. Symlinks are unlinked, never followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl Remover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match result {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Result of a completed removal phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    /// Paths removed
    pub removed: usize,
}

impl DeletionSet {
    /// Remove every path, consuming the set.
    ///
    /// Stops between paths once `signals` reports a cancellation request.
    pub fn remove_all<R: Remover + ?Sized>(
        self,
        remover: &R,
        signals: &SignalState,
    ) -> SweepResult<RemovalReport> {
        let paths = self.into_vec();
        let total = paths.len();
        let mut removed = 0;

        for path in paths {
            if signals.is_cancel_requested() {
                warn!(removed, remaining = total - removed, "removal interrupted");
                return Err(SweepError::Interrupted {
                    removed,
                    remaining: total - removed,
                });
            }
            if let Err(source) = remover.remove(&path) {
                return Err(SweepError::Removal {
                    path,
                    removed,
                    source,
                });
            }
            debug!(path = %path.display(), "removed");
            removed += 1;
        }

        info!(removed, "removal complete");
        Ok(RemovalReport { removed })
    }
}

//! Error taxonomy for a sweep run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for sweep operations.
pub type SweepResult<T> = Result<T, SweepError>;

/// Fatal errors of a sweep run.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Bad configuration, unreadable reference list or cache root.
    /// Nothing has been deleted.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The tree walk failed; the partial deletion set was discarded.
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A path given for inspection does not lie under the cache root.
    #[error("{} is outside cache root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// A removal failed after `removed` paths were already deleted.
    #[error("failed to remove {} after {removed} successful removals: {source}", path.display())]
    Removal {
        path: PathBuf,
        removed: usize,
        #[source]
        source: io::Error,
    },

    /// Cancellation was requested between removals.
    #[error("interrupted after {removed} removals, {remaining} paths left")]
    Interrupted { removed: usize, remaining: usize },
}

impl SweepError {
    /// Number of paths already removed when the error occurred.
    pub fn removed(&self) -> usize {
        match self {
            SweepError::Removal { removed, .. } | SweepError::Interrupted { removed, .. } => {
                *removed
            }
            SweepError::Config(_) | SweepError::Walk { .. } | SweepError::OutsideRoot { .. } => 0,
        }
    }
}

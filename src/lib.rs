//! Bazel cache sweeper
//!
//! Bounds the size of a Bazel cache directory by removing entries whose last
//! access is older than a retention window, while keeping the install base,
//! embedded tools, the server lock and every external repository that is
//! still referenced.
//!
//! A run is: load configuration → read the reference list → walk the tree
//! and collect a [`DeletionSet`] → remove it.

pub mod config;
pub mod error;
pub mod logging;
pub mod removal;
pub mod signal;
pub mod sweep;

pub use bazel_sweep_policy as policy;
pub use config::{CliOverrides, ConfigError, SweepConfig};
pub use error::{SweepError, SweepResult};
pub use removal::{FsRemover, RemovalReport, Remover};
pub use signal::{SignalHandler, SignalState};
pub use sweep::{CacheSweeper, DeletionSet, SweepReport, SweepStats};

use std::time::SystemTime;

use serde::Serialize;
use tracing::info;

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub cache_dir: String,
    pub keep_days: u32,
    pub stats: SweepStats,
    pub removed: usize,
}

/// Execute a full run: references, walk, removal.
///
/// Nothing is removed unless the walk completed without error.
pub fn run<R: Remover + ?Sized>(
    config: &SweepConfig,
    remover: &R,
    signals: &SignalState,
) -> SweepResult<RunSummary> {
    info!(
        cache_dir = %config.cache_dir.display(),
        "starting clean up of Bazel directory, this may take a couple of minutes"
    );
    config.check_cache_root()?;
    let references = config.load_references()?;
    let policy = config.to_policy(references, SystemTime::now());

    let report = CacheSweeper::new(&policy).sweep()?;
    let removal = report.deletion_set.remove_all(remover, signals)?;

    info!(removed = removal.removed, "finished cleaning Bazel cache");
    Ok(RunSummary {
        cache_dir: config.cache_dir.display().to_string(),
        keep_days: config.keep_days,
        stats: report.stats,
        removed: removal.removed,
    })
}

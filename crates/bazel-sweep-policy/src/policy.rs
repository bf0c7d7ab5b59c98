//! The retention decision function.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::decision::{Decision, Protection, SkipReason};
use crate::entry::CacheEntry;
use crate::reference::ActiveReferenceSet;
use crate::rules::ProtectionRules;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Immutable retention policy for one sweep.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    cache_root: PathBuf,
    retention: Duration,
    references: ActiveReferenceSet,
    rules: ProtectionRules,
    now: SystemTime,
}

impl RetentionPolicy {
    /// Create a policy evaluated against the current wall clock.
    pub fn new(
        cache_root: impl Into<PathBuf>,
        retention: Duration,
        references: ActiveReferenceSet,
        rules: ProtectionRules,
    ) -> Self {
        Self::evaluated_at(cache_root, retention, references, rules, SystemTime::now())
    }

    /// Create a policy evaluated against a fixed instant.
    pub fn evaluated_at(
        cache_root: impl Into<PathBuf>,
        retention: Duration,
        references: ActiveReferenceSet,
        rules: ProtectionRules,
        now: SystemTime,
    ) -> Self {
        Self {
            cache_root: cache_root.into(),
            retention,
            references,
            rules,
            now,
        }
    }

    /// Retention window of `days` whole days.
    pub fn days(days: u32) -> Duration {
        Duration::from_secs(u64::from(days) * SECONDS_PER_DAY)
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn references(&self) -> &ActiveReferenceSet {
        &self.references
    }

    pub fn rules(&self) -> &ProtectionRules {
        &self.rules
    }

    pub fn now(&self) -> SystemTime {
        self.now
    }

    /// Whether `entry` was last accessed longer ago than the retention window.
    ///
    /// Unknown and future access times are never stale.
    pub fn is_stale(&self, entry: &CacheEntry) -> bool {
        let Some(accessed) = entry.last_access else {
            return false;
        };
        match self.now.duration_since(accessed) {
            Ok(age) => age > self.retention,
            Err(_) => false,
        }
    }

    /// Classify one entry.
    ///
    /// Checks run in a fixed order: root, staleness, active references,
    /// static protection, directory retention, and only then deletion.
    pub fn classify(&self, entry: &CacheEntry) -> Decision {
        if entry.path == self.cache_root {
            return Decision::SkipToContinue {
                reason: SkipReason::CacheRoot,
            };
        }

        if !self.is_stale(entry) {
            let reason = if entry.last_access.is_none() {
                SkipReason::AccessTimeUnknown
            } else {
                SkipReason::Recent
            };
            return Decision::SkipToContinue { reason };
        }

        if self.references.contains(&entry.basename) {
            if entry.is_dir {
                return Decision::PruneSubtree;
            }
            return Decision::Protect {
                reason: Protection::ActiveReference,
            };
        }

        if let Some(reason) = self
            .rules
            .basename_protection(entry)
            .or_else(|| self.rules.structural_protection(entry, &self.cache_root))
        {
            return Decision::Protect { reason };
        }

        if entry.is_dir && !self.rules.delete_directories {
            return Decision::SkipToContinue {
                reason: SkipReason::DirectoryRetained,
            };
        }

        Decision::Delete
    }
}

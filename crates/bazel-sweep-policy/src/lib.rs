//! Retention classification for Bazel cache entries.
//!
//! Given an entry of the cache tree and an immutable [`RetentionPolicy`],
//! decides whether the entry is deleted, protected, skipped, or whether its
//! whole subtree is pruned from the walk. Classification is pure: it does no
//! I/O and cannot fail.

mod access_time;
mod decision;
mod entry;
mod policy;
mod reference;
mod rules;

pub use access_time::{resolve_access_time, StatRecord, Timespec};
pub use decision::{Decision, Protection, SkipReason};
pub use entry::CacheEntry;
pub use policy::RetentionPolicy;
pub use reference::{ActiveReferenceSet, ReferenceListError};
pub use rules::{
    ProtectionRules, DEFAULT_PROTECTED_DIRECTORIES, DEFAULT_STRUCTURAL_MARKERS,
    DEFAULT_WORKING_CACHE, LOCK_FILE,
};

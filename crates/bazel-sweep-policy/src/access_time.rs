//! Last-access time resolution from platform status records.
//!
//! Linux-family kernels expose the access time as `st_atim`, the BSD family
//! (Darwin included) as `st_atimespec`. Both hold a seconds + nanoseconds
//! pair. Which layout exists is fixed per target, so the capture is selected
//! at compile time and resolution only has to validate the pair.
//!
//! An unresolvable access time is `None`, never the epoch: the epoch is older
//! than every retention window and would make the entry look stale.

use std::fs::Metadata;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Seconds + nanoseconds pair as stored in a `timespec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: i64,
}

impl Timespec {
    pub fn new(sec: i64, nsec: i64) -> Self {
        Self { sec, nsec }
    }

    /// Convert to a wall-clock instant, rejecting out-of-range nanoseconds.
    fn to_system_time(self) -> Option<SystemTime> {
        if !(0..NANOS_PER_SEC).contains(&self.nsec) {
            return None;
        }
        let nanos = Duration::from_nanos(self.nsec as u64);
        let whole = if self.sec >= 0 {
            UNIX_EPOCH.checked_add(Duration::from_secs(self.sec as u64))?
        } else {
            UNIX_EPOCH.checked_sub(Duration::from_secs(self.sec.unsigned_abs()))?
        };
        whole.checked_add(nanos)
    }
}

/// Access-time fields of a raw file status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatRecord {
    /// Linux-style `st_atim`.
    Atim(Timespec),
    /// BSD/Darwin-style `st_atimespec`.
    Atimespec(Timespec),
    /// The target exposes neither layout.
    Unavailable,
}

impl StatRecord {
    /// Capture the access-time fields of `metadata` for the current target.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        StatRecord::Atim(Timespec::new(metadata.atime(), metadata.atime_nsec()))
    }

    /// Capture the access-time fields of `metadata` for the current target.
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        StatRecord::Atimespec(Timespec::new(metadata.atime(), metadata.atime_nsec()))
    }

    /// Capture the access-time fields of `metadata` for the current target.
    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    )))]
    pub fn from_metadata(_metadata: &Metadata) -> Self {
        StatRecord::Unavailable
    }
}

/// Resolve the last-access time of a status record.
///
/// Returns `None` when the record carries no usable layout or when the
/// nanosecond field is out of range.
pub fn resolve_access_time(record: &StatRecord) -> Option<SystemTime> {
    match record {
        StatRecord::Atim(ts) => ts.to_system_time(),
        StatRecord::Atimespec(ts) => ts.to_system_time(),
        StatRecord::Unavailable => None,
    }
}

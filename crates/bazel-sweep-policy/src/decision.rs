//! Classification outcomes.

use serde::{Deserialize, Serialize};

/// Why an entry is kept despite being stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "detail")]
pub enum Protection {
    /// Basename is an active external target or its marker.
    #[serde(rename = "ACTIVE_REFERENCE")]
    ActiveReference,

    /// File basename is in the protected file set.
    #[serde(rename = "PROTECTED_FILE")]
    ProtectedFile(String),

    /// Directory basename is in the protected directory set.
    #[serde(rename = "PROTECTED_DIRECTORY")]
    ProtectedDirectory(String),

    /// A parent path segment carries a build-tool internal marker.
    #[serde(rename = "STRUCTURAL_MARKER")]
    StructuralMarker(String),

    /// Direct child of the cache root other than the working cache.
    #[serde(rename = "ROOT_CHILD")]
    RootChild,
}

/// Why an entry is neither deleted nor protected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// The entry is the cache root.
    CacheRoot,
    /// Accessed within the retention window.
    Recent,
    /// The access time could not be resolved.
    AccessTimeUnknown,
    /// Stale directory kept because directory deletion is disabled.
    DirectoryRetained,
}

/// Outcome of classifying one entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Record for removal; do not descend.
    Delete,
    /// Keep; descend if a directory.
    Protect { reason: Protection },
    /// Keep and do not visit any descendant.
    PruneSubtree,
    /// Not a candidate; descend if a directory.
    SkipToContinue { reason: SkipReason },
}

impl Decision {
    pub fn is_delete(&self) -> bool {
        matches!(self, Decision::Delete)
    }

    /// Whether the walk should enter this entry's children.
    pub fn descends(&self) -> bool {
        matches!(self, Decision::Protect { .. } | Decision::SkipToContinue { .. })
    }

    /// Machine-readable code, e.g. `PROTECT:PROTECTED_FILE:lock`.
    pub fn to_code(&self) -> String {
        match self {
            Decision::Delete => "DELETE".to_string(),
            Decision::PruneSubtree => "PRUNE_SUBTREE".to_string(),
            Decision::Protect { reason } => format!("PROTECT:{}", reason.to_code()),
            Decision::SkipToContinue { reason } => format!("SKIP:{}", reason.to_code()),
        }
    }
}

impl Protection {
    pub fn to_code(&self) -> String {
        match self {
            Protection::ActiveReference => "ACTIVE_REFERENCE".to_string(),
            Protection::ProtectedFile(name) => format!("PROTECTED_FILE:{}", name),
            Protection::ProtectedDirectory(name) => format!("PROTECTED_DIRECTORY:{}", name),
            Protection::StructuralMarker(marker) => format!("STRUCTURAL_MARKER:{}", marker),
            Protection::RootChild => "ROOT_CHILD".to_string(),
        }
    }
}

impl SkipReason {
    pub fn to_code(&self) -> &'static str {
        match self {
            SkipReason::CacheRoot => "CACHE_ROOT",
            SkipReason::Recent => "RECENT",
            SkipReason::AccessTimeUnknown => "ACCESS_TIME_UNKNOWN",
            SkipReason::DirectoryRetained => "DIRECTORY_RETAINED",
        }
    }
}

//! Active external repository targets.
//!
//! Every fetched external repository lives under `external/<target>` and is
//! accompanied by an `@<target>.marker` file. Both names must survive a sweep
//! while the target is still in use, otherwise Bazel refetches it.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to read the reference list in full.
#[derive(Debug, Error)]
#[error("failed to read reference list {}: {source}", path.display())]
pub struct ReferenceListError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Immutable set of basenames that are currently referenced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveReferenceSet {
    names: HashSet<String>,
}

impl ActiveReferenceSet {
    /// An empty set: nothing is referenced.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Marker file name Bazel writes next to a fetched repository.
    pub fn marker_name(target: &str) -> String {
        format!("@{}.marker", target)
    }

    /// Build the set from target identifiers, adding each marker name.
    pub fn from_targets<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = HashSet::new();
        for target in targets {
            let target = target.into();
            names.insert(Self::marker_name(&target));
            names.insert(target);
        }
        Self { names }
    }

    /// Read one identifier per line. Blank lines are skipped; other lines are
    /// taken verbatim. Any read error fails the whole construction.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut targets = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            targets.push(line);
        }
        Ok(Self::from_targets(targets))
    }

    /// Read the reference list at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ReferenceListError> {
        let wrap = |source| ReferenceListError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(wrap)?;
        Self::from_reader(BufReader::new(file)).map_err(wrap)
    }

    /// Exact membership test against a basename.
    pub fn contains(&self, basename: &str) -> bool {
        self.names.contains(basename)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

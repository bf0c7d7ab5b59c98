//! Sweep configuration
//!
//! Three layers, merged in order:
//! 1. Built-in defaults
//! 2. Config file (`.bazel-sweep.toml` or `--config`)
//! 3. CLI flags
//!
//! The merged result is validated once and is immutable afterwards.

mod defaults;
mod merge;

pub use defaults::{builtin_layer, DEFAULT_CONFIG_PATH};
pub use merge::{deep_merge, merge_layers};

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use bazel_sweep_policy::{ActiveReferenceSet, ProtectionRules, ReferenceListError, RetentionPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Configuration errors. None of these leave anything deleted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("cache root {} is not accessible: {source}", path.display())]
    CacheRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cache root {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error(transparent)]
    ReferenceList(#[from] ReferenceListError),
}

/// Values set on the command line. Unset fields leave earlier layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_days: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_list: Option<PathBuf>,
}

/// Shape of a merged layer before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    cache_dir: Option<PathBuf>,
    #[serde(default)]
    keep_days: u32,
    reference_list: Option<PathBuf>,
    #[serde(default)]
    protect: ProtectionRules,
}

/// Validated, immutable sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepConfig {
    /// Root of the tree to sweep.
    pub cache_dir: PathBuf,
    /// Entries accessed within this many days are kept.
    pub keep_days: u32,
    /// Line-delimited list of active external repository targets.
    pub reference_list: Option<PathBuf>,
    /// Static protection rules.
    pub protect: ProtectionRules,
}

impl SweepConfig {
    /// Configuration with the default Bazel protection rules.
    pub fn new(cache_dir: impl Into<PathBuf>, keep_days: u32) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            keep_days,
            reference_list: None,
            protect: ProtectionRules::default(),
        }
    }

    pub fn with_reference_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_list = Some(path.into());
        self
    }

    pub fn with_rules(mut self, rules: ProtectionRules) -> Self {
        self.protect = rules;
        self
    }

    /// Merge all layers and validate.
    ///
    /// An explicit `config_file` must exist; without one, the default path
    /// is used only if present.
    pub fn load(config_file: Option<&Path>, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let mut layers = vec![builtin_layer()];
        match config_file {
            Some(path) => layers.push(read_file_layer(path)?),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    layers.push(read_file_layer(default_path)?);
                }
            }
        }
        layers.push(serde_json::to_value(overrides)?);
        Self::from_value(merge_layers(layers))
    }

    /// Parse a TOML document as the only layer above the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file_layer: Value = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Self::from_value(merge_layers(vec![builtin_layer(), file_layer]))
    }

    fn from_value(value: Value) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_value(value)?;
        let cache_dir = raw
            .cache_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| ConfigError::Validation("cache_dir is required".to_string()))?;
        let keep_days = raw.keep_days;

        let mut protect = raw.protect;
        if protect.working_cache.as_deref() == Some("") {
            protect.working_cache = None;
        }

        let config = Self {
            cache_dir,
            keep_days,
            reference_list: raw.reference_list,
            protect,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the protection names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = self
            .protect
            .files
            .iter()
            .chain(&self.protect.directories)
            .chain(&self.protect.working_cache);
        for name in names {
            if !is_single_segment(name) {
                return Err(ConfigError::Validation(format!(
                    "protected name '{}' must be a single path segment",
                    name
                )));
            }
        }
        for marker in &self.protect.structural_markers {
            if !is_single_segment(marker) {
                return Err(ConfigError::Validation(format!(
                    "structural marker '{}' must be a non-empty name without separators",
                    marker
                )));
            }
        }
        Ok(())
    }

    /// The cache root must exist, be a directory and be listable.
    pub fn check_cache_root(&self) -> Result<(), ConfigError> {
        let wrap = |source| ConfigError::CacheRoot {
            path: self.cache_dir.clone(),
            source,
        };
        let metadata = fs::metadata(&self.cache_dir).map_err(wrap)?;
        if !metadata.is_dir() {
            return Err(ConfigError::NotADirectory(self.cache_dir.clone()));
        }
        fs::read_dir(&self.cache_dir).map_err(wrap)?;
        Ok(())
    }

    /// Read the reference list in full; no list means nothing is referenced.
    pub fn load_references(&self) -> Result<ActiveReferenceSet, ConfigError> {
        match &self.reference_list {
            Some(path) => Ok(ActiveReferenceSet::from_file(path)?),
            None => Ok(ActiveReferenceSet::empty()),
        }
    }

    /// Build the policy for one run, judged against `now`.
    pub fn to_policy(&self, references: ActiveReferenceSet, now: SystemTime) -> RetentionPolicy {
        RetentionPolicy::evaluated_at(
            &self.cache_dir,
            RetentionPolicy::days(self.keep_days),
            references,
            self.protect.clone(),
            now,
        )
    }
}

fn read_file_layer(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn is_single_segment(name: &str) -> bool {
    if name.contains(std::path::is_separator) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

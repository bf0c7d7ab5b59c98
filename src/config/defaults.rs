//! Built-in defaults (first layer).

use bazel_sweep_policy::ProtectionRules;
use serde_json::{json, Value};

/// Default location of the optional config file, relative to the working
/// directory.
pub const DEFAULT_CONFIG_PATH: &str = ".bazel-sweep.toml";

/// The built-in layer. The cache directory has no default; the retention
/// window defaults to zero days.
pub fn builtin_layer() -> Value {
    json!({
        "cache_dir": null,
        "keep_days": 0,
        "reference_list": null,
        "protect": ProtectionRules::default(),
    })
}

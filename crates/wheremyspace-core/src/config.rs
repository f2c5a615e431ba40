//! Scan configuration types.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::platform::{PathClassifier, PathRule, PathRules, Platform};

/// Configuration for one scan invocation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Maximum children kept per directory node.
    #[builder(default = "100")]
    #[serde(default = "default_max_children")]
    pub max_children: usize,

    /// Minimum wall-clock time between progress events.
    #[builder(default = "Duration::from_millis(500)")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: Duration,

    /// Emit a progress event whenever the processed count crosses a
    /// multiple of this value.
    #[builder(default = "100")]
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,

    /// Number of threads for scanning (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Follow symbolic links into directories and files.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Directories deeper than this are not opened.
    #[builder(default = "512")]
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Platform whose path tables apply.
    #[builder(default)]
    #[serde(default)]
    pub platform: Platform,

    /// Additional protected rules, appended to the built-in table.
    #[builder(default)]
    #[serde(default)]
    pub extra_protected: Vec<PathRule>,

    /// Additional elevation-required rules, appended to the built-in table.
    #[builder(default)]
    #[serde(default)]
    pub extra_elevated: Vec<PathRule>,
}

fn default_max_children() -> usize {
    100
}

fn default_progress_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_progress_every() -> u64 {
    100
}

fn default_max_depth() -> u32 {
    512
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.max_children == Some(0) {
            return Err("max_children must be at least 1".to_string());
        }
        if self.progress_every == Some(0) {
            return Err("progress_every must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_children: default_max_children(),
            progress_interval: default_progress_interval(),
            progress_every: default_progress_every(),
            threads: 0,
            follow_symlinks: false,
            max_depth: default_max_depth(),
            platform: Platform::current(),
            extra_protected: Vec::new(),
            extra_elevated: Vec::new(),
        }
    }

    /// Built-in tables for the configured platform plus the extra entries.
    pub fn path_rules(&self) -> PathRules {
        let mut rules = PathRules::builtin(self.platform);
        rules.extend(PathRules {
            protected: self.extra_protected.clone(),
            elevated: self.extra_elevated.clone(),
        });
        rules
    }

    /// Path classifier for this configuration.
    pub fn classifier(&self) -> PathClassifier {
        PathClassifier::with_rules(self.platform, self.path_rules())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

//! Configuration file handling.
//!
//! This module loads `code-pushup.toml`, checks it against the core config
//! schema, and merges command-line overrides on top.

use crate::cli::CollectArgs;
use crate::models::{CategoryConfig, PluginConfig};
use crate::schema::validate_core_config;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "code-pushup.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where report artifacts are written.
    #[serde(default)]
    pub persist: PersistConfig,

    /// Execution settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Plugins to run, in report order.
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,

    /// Weighted audit groupings.
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

/// Report persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistConfig {
    /// Output directory for report artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Artifact file name without extension.
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            filename: default_filename(),
        }
    }
}

impl PersistConfig {
    /// Path of the artifact with the given extension.
    pub fn artifact_path(&self, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.filename, extension))
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".code-pushup")
}

fn default_filename() -> String {
    "report".to_string()
}

/// Plugin execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum number of plugins running at once.
    #[serde(default = "default_parallel")]
    pub parallel: usize,

    /// Keep going when a plugin fails, recording it as missing.
    #[serde(default)]
    pub continue_on_error: bool,

    /// Category slugs to report; empty keeps all.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            continue_on_error: false,
            categories: Vec::new(),
        }
    }
}

fn default_parallel() -> usize {
    1
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: serde_json::Value =
            toml::from_str(content).context("Failed to parse TOML")?;

        Ok(validate_core_config(&raw)?)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with `collect` arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &CollectArgs) {
        if let Some(parallel) = args.parallel {
            self.run.parallel = parallel;
        }

        if args.continue_on_error {
            self.run.continue_on_error = true;
        }

        if let Some(ref output_dir) = args.output_dir {
            self.persist.output_dir = output_dir.clone();
        }

        if let Some(ref categories) = args.categories {
            self.run.categories = categories.clone();
        }
    }
}

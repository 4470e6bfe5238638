//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.telemetry-analyzer.toml` files.

use crate::analysis::{DEFAULT_MARKER, DEFAULT_SEPARATOR};
use crate::registry::NameRegistry;
use crate::report::{ATTRIBUTE_FILE, FEATURE_FILE};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".telemetry-analyzer.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Export and chart settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Extra or replacement identifier -> display name entries.
    #[serde(default)]
    pub registry: BTreeMap<String, String>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the JSON exports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Row filtering and key derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Substring a feature name must contain.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Separator ending the model identifier in a feature name.
    #[serde(default = "default_separator")]
    pub separator: char,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            separator: default_separator(),
        }
    }
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

/// Export file names and chart layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Feature map file name.
    #[serde(default = "default_feature_file")]
    pub feature_file: String,

    /// Attribute map file name.
    #[serde(default = "default_attribute_file")]
    pub attribute_file: String,

    /// Width of the longest chart bar.
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,

    /// Limit charts to the N largest entries.
    #[serde(default)]
    pub top: Option<usize>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            feature_file: default_feature_file(),
            attribute_file: default_attribute_file(),
            chart_width: default_chart_width(),
            top: None,
        }
    }
}

fn default_feature_file() -> String {
    FEATURE_FILE.to_string()
}

fn default_attribute_file() -> String {
    ATTRIBUTE_FILE.to_string()
}

fn default_chart_width() -> usize {
    40
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.aggregation.marker.is_empty() {
            bail!("aggregation.marker must not be empty");
        }
        if self.export.chart_width == 0 {
            bail!("export.chart_width must be at least 1");
        }
        if self.export.feature_file == self.export.attribute_file {
            bail!("export.feature_file and export.attribute_file must differ");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }
        if let Some(ref marker) = args.marker {
            self.aggregation.marker = marker.clone();
        }
        if let Some(ref name) = args.feature_file {
            self.export.feature_file = name.clone();
        }
        if let Some(ref name) = args.attribute_file {
            self.export.attribute_file = name.clone();
        }
        if let Some(width) = args.chart_width {
            self.export.chart_width = width;
        }
        if args.top.is_some() {
            self.export.top = args.top;
        }
    }

    /// Build the name registry: built-in entries plus `[registry]` overrides.
    pub fn name_registry(&self) -> NameRegistry {
        NameRegistry::builtin().with_overrides(&self.registry)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

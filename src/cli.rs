//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// telemetry-analyzer - per-feature attribute usage from telemetry CSVs
///
/// Reads a telemetry export (feature_name, attribute_name, count),
/// aggregates attribute usage for every configuration feature and writes
/// output.json / attributes.json.
///
/// Examples:
///   telemetry-analyzer telemetry.csv
///   telemetry-analyzer telemetry.csv --output-dir out --report report.md
///   cat telemetry.csv | telemetry-analyzer - --no-export
///   telemetry-analyzer --list-registry
///   telemetry-analyzer --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Telemetry CSV file to analyze (`-` reads stdin)
    #[arg(
        value_name = "INPUT",
        required_unless_present_any = ["init_config", "list_registry"]
    )]
    pub input: Option<PathBuf>,

    /// Directory the JSON exports are written to
    ///
    /// Defaults to the config file value, or the current directory.
    #[arg(short, long, value_name = "DIR", env = "TELEMETRY_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// File name of the feature map export
    #[arg(long, value_name = "NAME")]
    pub feature_file: Option<String>,

    /// File name of the attribute map export
    #[arg(long, value_name = "NAME")]
    pub attribute_file: Option<String>,

    /// Also write a report with bar charts to this path
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Show only the N largest entries in each chart
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Width of the longest chart bar, in characters
    #[arg(long, value_name = "COLS")]
    pub chart_width: Option<usize>,

    /// Substring a feature name must contain to be counted
    #[arg(long, value_name = "TEXT")]
    pub marker: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .telemetry-analyzer.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Aggregate and print the summary without writing JSON exports
    #[arg(long)]
    pub no_export: bool,

    /// Print the model identifier -> display name registry and exit
    #[arg(long)]
    pub list_registry: bool,

    /// Generate a default .telemetry-analyzer.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the input is read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.input.as_deref().is_some_and(|p| p.as_os_str() == "-")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config || self.list_registry {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if !self.reads_stdin() {
                if !input.exists() {
                    return Err(format!("Input file does not exist: {}", input.display()));
                }
                if input.is_dir() {
                    return Err(format!("Input path is a directory: {}", input.display()));
                }
            }
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.chart_width == Some(0) {
            return Err("--chart-width must be at least 1".to_string());
        }

        if let Some(ref marker) = self.marker {
            if marker.is_empty() {
                return Err("--marker must not be empty".to_string());
            }
        }

        for name in [&self.feature_file, &self.attribute_file].into_iter().flatten() {
            validate_file_name(name)?;
        }

        if let (Some(features), Some(attributes)) = (&self.feature_file, &self.attribute_file) {
            if features == attributes {
                return Err("Feature and attribute exports must use different file names".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Export names are plain file names inside the output directory.
fn validate_file_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Export file name must not be empty".to_string());
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!(
            "Export file name must not contain a path separator: {}",
            name
        ));
    }
    Ok(())
}

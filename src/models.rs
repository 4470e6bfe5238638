//! Data models for the telemetry analyzer.
//!
//! This module contains the core data structures shared by ingest,
//! aggregation, and report generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Accumulated count per attribute name within one feature.
pub type AttributeCounts = BTreeMap<String, u64>;

/// Feature Key -> maximum accumulated attribute count.
pub type FeatureMap = BTreeMap<String, u64>;

/// Feature Key -> attribute name -> accumulated count.
pub type AttributeMap = BTreeMap<String, AttributeCounts>;

/// A single telemetry record read from the input CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRow {
    /// Raw feature name, e.g. `PTPolicylistGen_Configuration`.
    pub feature_name: String,
    /// Attribute the usage count refers to.
    pub attribute_name: String,
    /// Usage count reported for this attribute.
    #[serde(deserialize_with = "deserialize_count")]
    pub count: u64,
}

/// Parse a count, ignoring whitespace around the digits.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim()
        .parse::<u64>()
        .map_err(|e| serde::de::Error::custom(format!("invalid count '{}': {}", raw, e)))
}

impl TelemetryRow {
    /// Creates a row from borrowed parts.
    #[allow(dead_code)] // Rows normally come from the CSV deserializer
    pub fn new(feature_name: &str, attribute_name: &str, count: u64) -> Self {
        Self {
            feature_name: feature_name.to_string(),
            attribute_name: attribute_name.to_string(),
            count,
        }
    }
}

impl fmt::Display for TelemetryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}={}",
            self.feature_name, self.attribute_name, self.count
        )
    }
}

/// Row counters collected while aggregating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Rows offered to the aggregator.
    pub rows_read: usize,
    /// Rows whose feature name carried the filter marker.
    pub rows_matched: usize,
    /// Rows ignored because the marker was absent.
    pub rows_skipped: usize,
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub feature_map: FeatureMap,
    pub attribute_map: AttributeMap,
    pub stats: AggregateStats,
}

impl AnalysisResult {
    /// Returns true when no row matched the filter.
    pub fn is_empty(&self) -> bool {
        self.feature_map.is_empty()
    }
}

/// Metadata about one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Input file that was analyzed (`-` for stdin).
    pub input: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Filter marker applied to feature names.
    pub marker: String,
    /// Row counters from the aggregation pass.
    pub stats: AggregateStats,
    /// Number of distinct features found.
    pub feature_count: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// The complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Per-feature maximum attribute counts.
    pub features: FeatureMap,
    /// Per-feature attribute counts.
    pub attributes: AttributeMap,
}

impl Report {
    /// Features ordered by count (highest first), ties broken by name.
    pub fn ranked_features(&self) -> Vec<(&str, u64)> {
        rank(&self.features)
    }

    /// Attributes of one feature ordered by count (highest first).
    pub fn ranked_attributes(&self, feature: &str) -> Vec<(&str, u64)> {
        self.attributes.get(feature).map(rank).unwrap_or_default()
    }

    /// Total number of distinct (feature, attribute) pairs.
    pub fn attribute_pairs(&self) -> usize {
        self.attributes.values().map(|a| a.len()).sum()
    }
}

/// Sort map entries by descending count, then ascending key.
pub fn rank(map: &BTreeMap<String, u64>) -> Vec<(&str, u64)> {
    let mut entries: Vec<(&str, u64)> = map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

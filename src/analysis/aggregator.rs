//! Feature and attribute usage aggregation.
//!
//! Rows are grouped by Feature Key (the registry-resolved prefix of the
//! feature name) and attribute name. For every feature the aggregator also
//! tracks the largest accumulated attribute count seen so far.

use crate::models::{AggregateStats, AnalysisResult, AttributeMap, FeatureMap, TelemetryRow};
use crate::registry::NameRegistry;
use thiserror::Error;
use tracing::{debug, trace};

/// Feature names must contain this marker to be counted.
pub const DEFAULT_MARKER: &str = "Configuration";

/// Separator between the model identifier and the rest of a feature name.
pub const DEFAULT_SEPARATOR: char = '_';

/// Errors raised while folding rows into the maps.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("count for '{attribute}' in feature '{feature}' exceeds {}", u64::MAX)]
    Overflow { feature: String, attribute: String },
}

/// Incremental aggregator over telemetry rows.
#[derive(Debug)]
pub struct Aggregator<'r> {
    registry: &'r NameRegistry,
    marker: String,
    separator: char,
    feature_map: FeatureMap,
    attribute_map: AttributeMap,
    stats: AggregateStats,
}

impl<'r> Aggregator<'r> {
    /// Create an aggregator with the default marker and separator.
    pub fn new(registry: &'r NameRegistry) -> Self {
        Self {
            registry,
            marker: DEFAULT_MARKER.to_string(),
            separator: DEFAULT_SEPARATOR,
            feature_map: FeatureMap::new(),
            attribute_map: AttributeMap::new(),
            stats: AggregateStats::default(),
        }
    }

    /// Set the substring a feature name must contain.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set the model identifier separator.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Derive the Feature Key for a raw feature name.
    pub fn feature_key<'a>(&'a self, feature_name: &'a str) -> &'a str {
        // split always yields at least one item
        let model = feature_name
            .split(self.separator)
            .next()
            .unwrap_or(feature_name);
        self.registry.resolve(model)
    }

    /// Whether a row passes the marker filter.
    pub fn matches(&self, row: &TelemetryRow) -> bool {
        row.feature_name.contains(self.marker.as_str())
    }

    /// Fold one row into the maps.
    ///
    /// The maps are left untouched when the accumulated count would overflow.
    pub fn record(&mut self, row: &TelemetryRow) -> Result<(), AggregateError> {
        self.stats.rows_read += 1;

        if !self.matches(row) {
            self.stats.rows_skipped += 1;
            trace!("Skipping row without marker: {}", row);
            return Ok(());
        }

        let key = self.feature_key(&row.feature_name).to_string();

        let stored = self
            .attribute_map
            .get(&key)
            .and_then(|attributes| attributes.get(&row.attribute_name))
            .copied()
            .unwrap_or(0);
        let accumulated = stored
            .checked_add(row.count)
            .ok_or_else(|| AggregateError::Overflow {
                feature: key.clone(),
                attribute: row.attribute_name.clone(),
            })?;

        self.stats.rows_matched += 1;
        self.attribute_map
            .entry(key.clone())
            .or_default()
            .insert(row.attribute_name.clone(), accumulated);

        let max = self.feature_map.entry(key).or_insert(0);
        *max = (*max).max(accumulated);
        Ok(())
    }

    /// Fold a sequence of rows in order, stopping at the first error.
    pub fn extend<'a, I>(&mut self, rows: I) -> Result<(), AggregateError>
    where
        I: IntoIterator<Item = &'a TelemetryRow>,
    {
        for row in rows {
            self.record(row)?;
        }
        Ok(())
    }

    /// Consume the aggregator and return both maps.
    pub fn finish(self) -> AnalysisResult {
        debug!(
            "Aggregated {} rows ({} matched, {} skipped) into {} features",
            self.stats.rows_read,
            self.stats.rows_matched,
            self.stats.rows_skipped,
            self.feature_map.len()
        );

        AnalysisResult {
            feature_map: self.feature_map,
            attribute_map: self.attribute_map,
            stats: self.stats,
        }
    }
}

/// Aggregate rows in one pass.
pub fn aggregate(
    rows: &[TelemetryRow],
    registry: &NameRegistry,
    marker: &str,
    separator: char,
) -> Result<AnalysisResult, AggregateError> {
    let mut aggregator = Aggregator::new(registry)
        .with_marker(marker)
        .with_separator(separator);
    aggregator.extend(rows)?;
    Ok(aggregator.finish())
}

/// Sum of every accumulated attribute count per feature.
pub fn feature_totals(attributes: &AttributeMap) -> FeatureMap {
    attributes
        .iter()
        .map(|(feature, counts)| (feature.clone(), counts.values().sum()))
        .collect()
}

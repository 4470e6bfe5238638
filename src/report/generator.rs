//! Report generation.
//!
//! Produces the two JSON exports (feature map and attribute map) and a
//! Markdown report with text bar charts.

use crate::analysis::feature_totals;
use crate::models::{AttributeMap, FeatureMap, Report, ReportMetadata};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default file name of the feature map export.
pub const FEATURE_FILE: &str = "output.json";

/// Default file name of the attribute map export.
pub const ATTRIBUTE_FILE: &str = "attributes.json";

/// Glyph used for chart bars.
const BAR_GLYPH: char = '█';

/// Serialize a value as UTF-8 JSON with a four-space indent.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize JSON")?;
    String::from_utf8(buffer).context("Serialized JSON was not UTF-8")
}

/// JSON text of the feature map (`output.json`).
pub fn feature_map_json(features: &FeatureMap) -> Result<String> {
    to_json_pretty(features)
}

/// JSON text of the attribute map (`attributes.json`).
pub fn attribute_map_json(attributes: &AttributeMap) -> Result<String> {
    to_json_pretty(attributes)
}

/// Paths of the written export files.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub features: PathBuf,
    pub attributes: PathBuf,
}

/// Write both JSON exports into `dir`, creating it if needed.
///
/// Both documents are serialized before anything touches the disk.
pub fn write_exports(
    dir: &Path,
    feature_file: &str,
    attribute_file: &str,
    features: &FeatureMap,
    attributes: &AttributeMap,
) -> Result<ExportPaths> {
    let features_json = feature_map_json(features)?;
    let attributes_json = attribute_map_json(attributes)?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let paths = ExportPaths {
        features: dir.join(feature_file),
        attributes: dir.join(attribute_file),
    };

    std::fs::write(&paths.features, features_json)
        .with_context(|| format!("Failed to write {}", paths.features.display()))?;
    info!("Data written to {}", paths.features.display());

    std::fs::write(&paths.attributes, attributes_json)
        .with_context(|| format!("Failed to write {}", paths.attributes.display()))?;
    info!("Data written to {}", paths.attributes.display());

    Ok(paths)
}

/// Render a horizontal text bar chart.
///
/// Bars are scaled so the largest value spans `width` glyphs; any
/// non-zero value gets at least one glyph.
pub fn render_bar_chart(entries: &[(&str, u64)], width: usize) -> String {
    let max = entries.iter().map(|(_, v)| *v).max().unwrap_or(0);
    let label_width = entries
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    let mut chart = String::new();
    for (label, value) in entries {
        let len = bar_length(*value, max, width);
        let bar: String = std::iter::repeat(BAR_GLYPH).take(len).collect();
        chart.push_str(&format!(
            "{:<label_width$} | {} {}\n",
            label,
            bar,
            value,
            label_width = label_width
        ));
    }
    chart
}

fn bar_length(value: u64, max: u64, width: usize) -> usize {
    if max == 0 || value == 0 {
        return 0;
    }
    let scaled = (value as u128 * width as u128) / max as u128;
    (scaled as usize).max(1)
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, chart_width: usize, top: Option<usize>) -> String {
    let mut output = String::new();

    output.push_str("# Telemetry Analysis\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_feature_section(report, chart_width, top));
    output.push_str(&generate_attribute_sections(report, chart_width, top));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Input:** `{}`\n", metadata.input));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Feature Marker:** `{}`\n", metadata.marker));
    section.push_str(&format!("- **Rows Read:** {}\n", metadata.stats.rows_read));
    section.push_str(&format!(
        "- **Rows Matched:** {}\n",
        metadata.stats.rows_matched
    ));
    if metadata.stats.rows_skipped > 0 {
        section.push_str(&format!(
            "- **Rows Skipped:** {}\n",
            metadata.stats.rows_skipped
        ));
    }
    section.push_str(&format!("- **Features:** {}\n", metadata.feature_count));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_feature_section(report: &Report, chart_width: usize, top: Option<usize>) -> String {
    let mut section = String::new();
    section.push_str("## Usage Count of Feature Config Names\n\n");

    let mut ranked = report.ranked_features();
    if ranked.is_empty() {
        section.push_str("No configuration features were found in the input.\n\n");
        return section;
    }
    if let Some(n) = top {
        ranked.truncate(n);
    }

    section.push_str("```text\n");
    section.push_str(&render_bar_chart(&ranked, chart_width));
    section.push_str("```\n\n");

    section
}

fn generate_attribute_sections(report: &Report, chart_width: usize, top: Option<usize>) -> String {
    let mut section = String::new();
    let totals = feature_totals(&report.attributes);

    for (feature, attributes) in &report.attributes {
        let mut ranked = report.ranked_attributes(feature);
        if let Some(n) = top {
            ranked.truncate(n);
        }

        section.push_str(&format!("### Usage Count of Attributes for {}\n\n", feature));
        section.push_str(&format!(
            "*Attributes: {} | Max: {} | Total: {}*\n\n",
            attributes.len(),
            report.features.get(feature).copied().unwrap_or(0),
            totals.get(feature).copied().unwrap_or(0)
        ));
        section.push_str("| Attribute | Count |\n");
        section.push_str("|:---|---:|\n");
        for (name, count) in &ranked {
            section.push_str(&format!("| {} | {} |\n", name, count));
        }
        section.push('\n');

        section.push_str("```text\n");
        section.push_str(&render_bar_chart(&ranked, chart_width));
        section.push_str("```\n\n");
    }

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by telemetry-analyzer*\n".to_string()
}

/// Generate a JSON summary of the whole report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    to_json_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AggregateStats;
    use chrono::Utc;

    fn create_test_report() -> Report {
        let mut attributes = AttributeMap::new();
        attributes.insert(
            "Policy Tags".to_string(),
            [("attrA".to_string(), 5), ("attrB".to_string(), 3)]
                .into_iter()
                .collect(),
        );
        attributes.insert(
            "Other".to_string(),
            [("attrA".to_string(), 10)].into_iter().collect(),
        );

        Report {
            metadata: ReportMetadata {
                input: "telemetry.csv".to_string(),
                analysis_date: Utc::now(),
                marker: "Configuration".to_string(),
                stats: AggregateStats {
                    rows_read: 4,
                    rows_matched: 3,
                    rows_skipped: 1,
                },
                feature_count: 2,
                duration_seconds: 0.01,
            },
            features: [("Policy Tags".to_string(), 5), ("Other".to_string(), 10)]
                .into_iter()
                .collect(),
            attributes,
        }
    }

    #[test]
    fn test_feature_map_json_uses_four_space_indent() {
        let report = create_test_report();
        let json = feature_map_json(&report.features).unwrap();

        assert_eq!(json, "{\n    \"Other\": 10,\n    \"Policy Tags\": 5\n}");
    }

    #[test]
    fn test_attribute_map_json_nesting() {
        let report = create_test_report();
        let json = attribute_map_json(&report.attributes).unwrap();

        assert!(json.contains("    \"Policy Tags\": {\n        \"attrA\": 5,"));

        let parsed: AttributeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report.attributes);
    }

    #[test]
    fn test_empty_maps_serialize_as_empty_objects() {
        assert_eq!(feature_map_json(&FeatureMap::new()).unwrap(), "{}");
        assert_eq!(attribute_map_json(&AttributeMap::new()).unwrap(), "{}");
    }

    #[test]
    fn test_write_exports() {
        let report = create_test_report();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");

        let paths = write_exports(
            &out,
            FEATURE_FILE,
            ATTRIBUTE_FILE,
            &report.features,
            &report.attributes,
        )
        .unwrap();

        assert_eq!(paths.features, out.join("output.json"));
        let written = std::fs::read_to_string(&paths.features).unwrap();
        let parsed: FeatureMap = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, report.features);
        assert!(paths.attributes.exists());
    }

    #[test]
    fn test_render_bar_chart_scales_to_width() {
        let chart = render_bar_chart(&[("long label", 10), ("b", 5), ("zero", 0)], 10);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("long label | {} 10", "█".repeat(10)));
        assert_eq!(lines[1], format!("b          | {} 5", "█".repeat(5)));
        assert_eq!(lines[2], "zero       |  0");
    }

    #[test]
    fn test_small_values_get_one_glyph() {
        assert_eq!(bar_length(1, 1000, 40), 1);
        assert_eq!(bar_length(0, 1000, 40), 0);
        assert_eq!(bar_length(5, 0, 40), 0);
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, 20, None);

        assert!(markdown.contains("# Telemetry Analysis"));
        assert!(markdown.contains("## Usage Count of Feature Config Names"));
        assert!(markdown.contains("### Usage Count of Attributes for Policy Tags"));
        assert!(markdown.contains("### Usage Count of Attributes for Other"));
        assert!(markdown.contains("| attrB | 3 |"));
        assert!(markdown.contains("**Rows Skipped:** 1"));
        assert!(markdown.contains("*Attributes: 2 | Max: 5 | Total: 8*"));
    }

    #[test]
    fn test_markdown_top_limits_rows() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, 20, Some(1));

        assert!(markdown.contains("| attrA | 5 |"));
        assert!(!markdown.contains("| attrB | 3 |"));
    }

    #[test]
    fn test_markdown_without_features() {
        let mut report = create_test_report();
        report.features.clear();
        report.attributes.clear();

        let markdown = generate_markdown_report(&report, 20, None);

        assert!(markdown.contains("No configuration features were found"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"rows_matched\": 3"));
    }
}

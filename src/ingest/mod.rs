//! Telemetry CSV ingestion.
//!
//! Reads a CSV export with a header row into typed [`TelemetryRow`]s.
//! The `feature_name`, `attribute_name` and `count` columns are required;
//! any other columns are ignored.

use crate::models::TelemetryRow;
use csv::{ReaderBuilder, Trim};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Columns every telemetry export must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["feature_name", "attribute_name", "count"];

/// Path value that selects standard input.
pub const STDIN_PATH: &str = "-";

/// Errors raised while reading telemetry input.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input is empty, provide a file with data")]
    Empty,

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("malformed record at line {line}: {source}")]
    Record {
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// Read rows from a file path, or stdin when the path is `-`.
pub fn read_rows(path: &Path) -> Result<Vec<TelemetryRow>, IngestError> {
    let label = path.display().to_string();

    if label == STDIN_PATH {
        return read_rows_from(io::stdin().lock(), "stdin");
    }

    let bytes = fs::read(path).map_err(|source| IngestError::Io {
        path: label.clone(),
        source,
    })?;

    info!("Read {} bytes from {}", bytes.len(), label);
    parse_bytes(&bytes)
}

/// Read rows from any reader; `label` names the source in errors.
pub fn read_rows_from<R: Read>(
    mut reader: R,
    label: &str,
) -> Result<Vec<TelemetryRow>, IngestError> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|source| IngestError::Io {
            path: label.to_string(),
            source,
        })?;

    info!("Read {} bytes from {}", buffer.len(), label);
    parse_bytes(&buffer)
}

/// Parse raw CSV bytes.
///
/// Zero-length input is reported as [`IngestError::Empty`] before parsing.
/// Only header names are trimmed; feature and attribute names keep their
/// surrounding whitespace.
pub fn parse_bytes(bytes: &[u8]) -> Result<Vec<TelemetryRow>, IngestError> {
    if bytes.is_empty() {
        return Err(IngestError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|source| IngestError::Record { line: 1, source })?
        .clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(IngestError::MissingColumn(column.to_string()));
        }
    }
    debug!("CSV headers: {:?}", headers);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| IngestError::Record {
            line: source.position().map_or(0, |p| p.line()),
            source,
        })?;
        let line = record.position().map_or(0, |p| p.line());

        let row: TelemetryRow = record
            .deserialize(Some(&headers))
            .map_err(|source| IngestError::Record { line, source })?;
        rows.push(row);
    }

    debug!("Parsed {} telemetry rows", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_csv() {
        let csv = "feature_name,attribute_name,count\n\
                   PTPolicylistGen_Configuration,attrA,5\n\
                   Other_Configuration,attrB,10\n";

        let rows = parse_bytes(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            TelemetryRow::new("PTPolicylistGen_Configuration", "attrA", 5)
        );
        assert_eq!(rows[1].count, 10);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "device,feature_name,count,attribute_name,site\n\
                   wlc-1,RrmGen_Configuration,3,mode,hq\n";

        let rows = parse_bytes(csv.as_bytes()).unwrap();

        assert_eq!(rows, vec![TelemetryRow::new("RrmGen_Configuration", "mode", 3)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_bytes(b""), Err(IngestError::Empty)));
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        let rows = parse_bytes(b"feature_name,attribute_name,count\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_column() {
        let csv = "feature_name,count\nRrmGen_Configuration,3\n";
        match parse_bytes(csv.as_bytes()) {
            Err(IngestError::MissingColumn(column)) => assert_eq!(column, "attribute_name"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_count() {
        let csv = "feature_name,attribute_name,count\n\
                   RrmGen_Configuration,mode,3\n\
                   RrmGen_Configuration,mode,lots\n";
        match parse_bytes(csv.as_bytes()) {
            Err(IngestError::Record { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected record error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_count_rejected() {
        let csv = "feature_name,attribute_name,count\nRrmGen_Configuration,mode,-1\n";
        assert!(matches!(
            parse_bytes(csv.as_bytes()),
            Err(IngestError::Record { .. })
        ));
    }

    #[test]
    fn test_headers_and_count_are_trimmed() {
        let csv = "feature_name , attribute_name , count\nRrmGen_Configuration,mode, 7 \n";
        let rows = parse_bytes(csv.as_bytes()).unwrap();
        assert_eq!(rows[0], TelemetryRow::new("RrmGen_Configuration", "mode", 7));
    }

    #[test]
    fn test_padded_names_are_kept() {
        let csv = "feature_name,attribute_name,count\n\
                   \x20PTPolicylistGen_Configuration,attrA ,5\n\
                   PTPolicylistGen_Configuration,attrA,3\n";
        let rows = parse_bytes(csv.as_bytes()).unwrap();

        assert_eq!(
            rows,
            vec![
                TelemetryRow::new(" PTPolicylistGen_Configuration", "attrA ", 5),
                TelemetryRow::new("PTPolicylistGen_Configuration", "attrA", 3),
            ]
        );
    }

    #[test]
    fn test_read_rows_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "feature_name,attribute_name,count").unwrap();
        writeln!(file, "Dot11Gen_Configuration,band,2").unwrap();

        let rows = read_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].feature_name, "Dot11Gen_Configuration");
    }

    #[test]
    fn test_read_rows_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(matches!(read_rows(&missing), Err(IngestError::Io { .. })));
    }

    #[test]
    fn test_read_rows_from_empty_reader() {
        assert!(matches!(
            read_rows_from(std::io::empty(), "empty"),
            Err(IngestError::Empty)
        ));
    }

    #[test]
    fn test_read_rows_from_reader() {
        let data = "feature_name,attribute_name,count\nRfTagGen_Configuration,x,1\n";
        let rows = read_rows_from(data.as_bytes(), "test").unwrap();
        assert_eq!(rows.len(), 1);
    }
}

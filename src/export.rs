use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::format::render_text;
use crate::record::TestCaseRecord;

const CSV_HEADER: &[&str] = &[
    "ID",
    "Name",
    "Scenario",
    "Priority",
    "Type",
    "Preconditions",
    "Steps",
    "Expected Result",
    "Test Data",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ExportFormat::Text),
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Text => write!(f, "text"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    test_cases: &'a [TestCaseRecord],
}

/// `test_cases_YYYYmmdd_HHMMSS.<ext>` for the current local time.
pub fn default_filename(format: ExportFormat) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("test_cases_{timestamp}.{}", format.extension()))
}

/// Write `records` to `path` in `format`, creating parent directories.
pub fn export(records: &[TestCaseRecord], path: &Path, format: ExportFormat) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Text => std::fs::write(path, render_text(records))?,
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonExport {
                test_cases: records,
            })
            .map_err(|e| Error::Export(format!("failed to serialize test cases: {e}")))?;
            std::fs::write(path, json)?;
        }
        ExportFormat::Csv => write_csv(records, path)?,
    }

    info!(path = %path.display(), %format, count = records.len(), "exported test cases");
    Ok(path.to_path_buf())
}

fn write_csv(records: &[TestCaseRecord], path: &Path) -> Result<()> {
    let csv_err = |e: csv::Error| Error::Export(format!("failed to write {}: {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(CSV_HEADER).map_err(csv_err)?;
    for tc in records {
        writer
            .write_record([
                tc.id.as_str(),
                tc.name.as_str(),
                tc.scenario.as_deref().unwrap_or_default(),
                tc.priority.as_str(),
                tc.test_type.as_str(),
                tc.preconditions.as_deref().unwrap_or_default(),
                tc.steps.as_deref().unwrap_or_default(),
                tc.expected_result.as_deref().unwrap_or_default(),
                tc.test_data.as_deref().unwrap_or_default(),
            ])
            .map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_record;
    use tempfile::TempDir;

    #[test]
    fn test_export_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cases.txt");
        let records = vec![make_record("TC_1")];
        export(&records, &path, ExportFormat::Text).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), render_text(&records));
    }

    #[test]
    fn test_export_json_wraps_test_cases() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cases.json");
        export(&[make_record("TC_1")], &path, ExportFormat::Json).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["test_cases"][0]["test_case_id"], "TC_1");
        assert_eq!(value["test_cases"][0]["priority"], "Medium");
    }

    #[test]
    fn test_export_csv_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("cases.csv");
        export(
            &[make_record("TC_1"), make_record("TC_2")],
            &path,
            ExportFormat::Csv,
        )
        .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, CSV_HEADER);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "TC_2");
        assert_eq!(&rows[0][6], "1. Open page\n2. Submit form");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("a/b.CSV")),
            Some(ExportFormat::Csv)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("cases.txt")),
            Some(ExportFormat::Text)
        );
        assert_eq!(ExportFormat::from_path(Path::new("cases.xlsx")), None);
        assert_eq!(ExportFormat::from_path(Path::new("cases")), None);
    }

    #[test]
    fn test_default_filename_shape() {
        let name = default_filename(ExportFormat::Csv);
        let name = name.to_string_lossy();
        assert!(name.starts_with("test_cases_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "test_cases_20240101_120000.csv".len());
    }
}

//! Snapshot CSV parsing and normalization.
//!
//! Turns a raw snapshot into `DatasetRow`s for one tracked metric:
//!
//! - rows whose metric cell is empty are excluded (not an error)
//! - a date or a non-empty metric cell that fails to parse is a hard error,
//!   reported with its line number
//! - no series logic here; selection and derivation live in `series`

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use csv::StringRecord;

use crate::data::cache::Snapshot;
use crate::domain::{DatasetRow, DateWindow, Metric};
use crate::error::AppError;

/// In-memory view of one snapshot, filtered to the tracked metric.
///
/// Treated as read-only once loaded; every user interaction transforms the
/// same `Dataset`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub metric: Metric,
    pub rows: Vec<DatasetRow>,
    pub rows_read: usize,
}

impl Dataset {
    pub fn from_snapshot(snapshot: &Snapshot, metric: Metric) -> Result<Self, AppError> {
        let bytes = snapshot.read_bytes()?;
        Self::from_bytes(&bytes, metric)
    }

    pub fn from_bytes(bytes: &[u8], metric: Metric) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| AppError::parse(format!("Failed to read snapshot headers: {e}")))?
            .clone();
        let header_map = build_header_map(&headers);

        for required in ["location", "date", metric.column()] {
            if !header_map.contains_key(required) {
                return Err(AppError::parse(format!(
                    "Snapshot is missing required column `{required}`."
                )));
            }
        }

        let mut rows = Vec::new();
        let mut rows_read = 0usize;

        for (idx, result) in reader.records().enumerate() {
            // +2 because:
            // - records() starts at line 1 after headers
            // - CSV is 1-based line numbers
            let line = idx + 2;
            rows_read += 1;

            let record =
                result.map_err(|e| AppError::parse(format!("Line {line}: CSV error: {e}")))?;

            if let Some(row) = parse_row(&record, &header_map, metric, line)? {
                rows.push(row);
            }
        }

        Ok(Self {
            metric,
            rows,
            rows_read,
        })
    }

    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }

    /// Sorted, de-duplicated entity names (the dropdown's option list).
    pub fn entities(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.entity.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// `(min, max)` dates over the entire dataset, regardless of selection.
    pub fn date_range(&self) -> Option<DateWindow> {
        let min = self.rows.iter().map(|r| r.date).min()?;
        let max = self.rows.iter().map(|r| r.date).max()?;
        Some(DateWindow { min, max })
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, column lookup fails for `location`.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    metric: Metric,
    line: usize,
) -> Result<Option<DatasetRow>, AppError> {
    let entity = get_field(record, header_map, "location")
        .ok_or_else(|| AppError::parse(format!("Line {line}: missing `location` value.")))?;

    let raw_date = get_field(record, header_map, "date")
        .ok_or_else(|| AppError::parse(format!("Line {line}: missing `date` value.")))?;
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|e| AppError::parse(format!("Line {line}: invalid date '{raw_date}': {e}")))?;

    // An empty metric cell means "no observation"; drop the row.
    let Some(raw_value) = get_field(record, header_map, metric.column()) else {
        return Ok(None);
    };
    let value = raw_value.parse::<f64>().map_err(|e| {
        AppError::parse(format!(
            "Line {line}: invalid `{}` value '{raw_value}': {e}",
            metric.column()
        ))
    })?;
    if !value.is_finite() {
        return Ok(None);
    }

    Ok(Some(DatasetRow {
        entity: entity.to_string(),
        date,
        value,
    }))
}

fn get_field<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
location,date,total_cases,new_cases
Italy,2021-01-01,100,5
Italy,2021-01-02,150,50
France,2021-01-03,,
France,2021-01-04,80,1
";

    #[test]
    fn empty_metric_cells_are_dropped() {
        let dataset = Dataset::from_bytes(SAMPLE.as_bytes(), Metric::TotalCases).unwrap();
        assert_eq!(dataset.rows_read, 4);
        assert_eq!(dataset.rows_used(), 3);
        assert!(
            dataset
                .rows
                .iter()
                .all(|r| !(r.entity == "France" && r.date.to_string() == "2021-01-03"))
        );
    }

    #[test]
    fn entities_are_sorted_and_unique() {
        let dataset = Dataset::from_bytes(SAMPLE.as_bytes(), Metric::TotalCases).unwrap();
        assert_eq!(dataset.entities(), vec!["France", "Italy"]);
    }

    #[test]
    fn date_range_spans_the_whole_snapshot() {
        let dataset = Dataset::from_bytes(SAMPLE.as_bytes(), Metric::TotalCases).unwrap();
        let window = dataset.date_range().unwrap();
        assert_eq!(window.min, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(window.max, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
    }

    #[test]
    fn invalid_date_is_a_parse_error() {
        let csv = "location,date,total_cases\nItaly,01/02/2021,100\n";
        let err = Dataset::from_bytes(csv.as_bytes(), Metric::TotalCases).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
        assert!(err.to_string().contains("Line 2"));
    }

    #[test]
    fn invalid_metric_value_is_a_parse_error() {
        let csv = "location,date,total_cases\nItaly,2021-01-02,n/a\n";
        let err = Dataset::from_bytes(csv.as_bytes(), Metric::TotalCases).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
    }

    #[test]
    fn missing_metric_column_is_reported() {
        let csv = "location,date\nItaly,2021-01-02\n";
        let err = Dataset::from_bytes(csv.as_bytes(), Metric::TotalCases).unwrap_err();
        assert!(err.to_string().contains("total_cases"));
    }

    #[test]
    fn bom_on_first_header_is_tolerated() {
        let csv = "\u{feff}location,date,total_cases\nItaly,2021-01-02,100\n";
        let dataset = Dataset::from_bytes(csv.as_bytes(), Metric::TotalCases).unwrap();
        assert_eq!(dataset.rows_used(), 1);
    }

    #[test]
    fn metric_selects_its_own_column() {
        let dataset = Dataset::from_bytes(SAMPLE.as_bytes(), Metric::NewCases).unwrap();
        let italy: Vec<f64> = dataset
            .rows
            .iter()
            .filter(|r| r.entity == "Italy")
            .map(|r| r.value)
            .collect();
        assert_eq!(italy, vec![5.0, 50.0]);
    }
}

//! Read/write chart JSON files.
//!
//! Chart JSON is the "portable" representation of one rendered dashboard
//! view: the title, the dataset-wide window, and per-entity points with the
//! optional last-increase marker and its annotation. Any UI shell can render
//! it without re-fetching or re-deriving anything.
//!
//! The schema is defined by `domain::ChartContent`.

use std::fs::File;
use std::path::Path;

use crate::domain::ChartContent;
use crate::error::AppError;

/// Write a chart JSON file.
pub fn write_chart_json(path: &Path, chart: &ChartContent) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create chart JSON '{}': {e}",
            path.display()
        ))
    })?;

    serde_json::to_writer_pretty(file, chart)
        .map_err(|e| AppError::usage(format!("Failed to write chart JSON: {e}")))?;

    Ok(())
}

/// Read a chart JSON file.
pub fn read_chart_json(path: &Path) -> Result<ChartContent, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to open chart JSON '{}': {e}",
            path.display()
        ))
    })?;
    let chart: ChartContent = serde_json::from_reader(file)
        .map_err(|e| AppError::usage(format!("Invalid chart JSON: {e}")))?;
    Ok(chart)
}

//! Export selected series to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per observation, with the successive difference and a
//! marker on the last-increase point.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::app::pipeline::RunOutput;
use crate::error::AppError;

/// Write the selected series to a CSV file.
pub fn write_series_csv(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "entity,date,metric,value,delta,last_increase")
        .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for series in run.series.values() {
        let mut prev: Option<f64> = None;
        for &(date, value) in &series.points {
            let delta = prev.map(|p| format!("{}", value - p)).unwrap_or_default();
            let marker = series
                .last_increase
                .map(|(d, _)| d == date)
                .unwrap_or(false);
            writeln!(
                file,
                "{},{},{},{},{},{}",
                series.entity,
                date,
                run.dataset.metric.column(),
                value,
                delta,
                if marker { "*" } else { "" },
            )
            .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
            prev = Some(value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use super::*;
    use crate::data::{Dataset, Snapshot};
    use crate::domain::{EntitySeries, Metric};
    use crate::series;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    fn run_output() -> RunOutput {
        let dataset = Dataset {
            metric: Metric::TotalCases,
            rows: vec![],
            rows_read: 0,
        };
        let points = vec![(day(1), 100.0), (day(2), 150.0), (day(3), 140.0)];
        let entity_series = EntitySeries {
            entity: "Italy".to_string(),
            last_increase: series::last_increase(&points),
            points,
        };
        let mut map = BTreeMap::new();
        map.insert("Italy".to_string(), entity_series);

        let snapshot = Snapshot {
            date: day(4),
            path: PathBuf::from("unused.csv"),
        };
        let chart = series::chart_content(&dataset, &map, snapshot.date);

        RunOutput {
            snapshot,
            window: dataset.date_range(),
            dataset,
            series: map,
            chart,
        }
    }

    #[test]
    fn csv_rows_carry_deltas_and_the_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");

        write_series_csv(&path, &run_output()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "entity,date,metric,value,delta,last_increase");
        assert_eq!(lines[1], "Italy,2021-01-01,total_cases,100,,");
        assert_eq!(lines[2], "Italy,2021-01-02,total_cases,150,50,*");
        assert_eq!(lines[3], "Italy,2021-01-03,total_cases,140,-10,");
    }
}

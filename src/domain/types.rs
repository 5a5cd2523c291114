//! Core data model.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during series building
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which dataset column is tracked as the metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    TotalCases,
    NewCases,
    TotalDeaths,
    NewDeaths,
}

impl Metric {
    /// CSV column name in the OWID dataset.
    pub fn column(self) -> &'static str {
        match self {
            Metric::TotalCases => "total_cases",
            Metric::NewCases => "new_cases",
            Metric::TotalDeaths => "total_deaths",
            Metric::NewDeaths => "new_deaths",
        }
    }

    /// Human-readable label for titles and axes.
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::TotalCases => "Total Cases",
            Metric::NewCases => "New Cases",
            Metric::TotalDeaths => "Total Deaths",
            Metric::NewDeaths => "New Deaths",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Metric::TotalCases => Metric::NewCases,
            Metric::NewCases => Metric::TotalDeaths,
            Metric::TotalDeaths => Metric::NewDeaths,
            Metric::NewDeaths => Metric::TotalCases,
        }
    }
}

/// One (entity, date, value) observation for the tracked metric.
///
/// Rows whose metric cell is empty never become a `DatasetRow`; they are
/// dropped during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub entity: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// Chart-ready series for one entity.
///
/// `points` is sorted ascending by date. `last_increase` is the most recent
/// point whose value strictly exceeds the immediately preceding value, or
/// `None` when the series has fewer than two points or never rises.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySeries {
    pub entity: String,
    pub points: Vec<(NaiveDate, f64)>,
    pub last_increase: Option<(NaiveDate, f64)>,
}

impl EntitySeries {
    /// Annotation text shown next to the `last_increase` marker.
    pub fn annotation(&self) -> Option<String> {
        self.last_increase
            .map(|_| format!("Reporting stopped for {}", self.entity))
    }
}

/// Dataset-wide reporting window, computed over the entire snapshot
/// (not just the selected entities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateWindow {
    /// `"Jan 01, 2021 – Jun 30, 2021"` style label for chart titles.
    pub fn display(&self) -> String {
        format!(
            "{} – {}",
            self.min.format("%b %d, %Y"),
            self.max.format("%b %d, %Y")
        )
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags plus `.env`/environment defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_url: String,
    pub data_dir: PathBuf,
    pub metric: Metric,
    pub countries: Vec<String>,
    /// Pinned cache day; `None` means use the system date.
    pub date: Option<NaiveDate>,

    pub export_results: Option<PathBuf>,
    pub export_chart: Option<PathBuf>,
}

impl RunConfig {
    /// The calendar day this run treats as "today" (the cache key).
    pub fn today(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Everything the rendering boundary needs for one chart, as structured data.
///
/// The core does not format colors, fonts, or layout; a UI shell (the bundled
/// TUI, or anything that reads the exported JSON) decides presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartContent {
    pub tool: String,
    pub snapshot_date: NaiveDate,
    pub metric: Metric,
    pub title: String,
    pub window: Option<DateWindow>,
    pub series: Vec<ChartSeries>,
}

/// One renderable line plus its optional stall marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    pub entity: String,
    pub points: Vec<(NaiveDate, f64)>,
    pub last_increase: Option<(NaiveDate, f64)>,
    pub annotation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_names_the_entity() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let series = EntitySeries {
            entity: "Italy".to_string(),
            points: vec![(d, 10.0)],
            last_increase: Some((d, 10.0)),
        };
        assert_eq!(
            series.annotation().as_deref(),
            Some("Reporting stopped for Italy")
        );

        let silent = EntitySeries {
            entity: "Italy".to_string(),
            points: vec![],
            last_increase: None,
        };
        assert_eq!(silent.annotation(), None);
    }

    #[test]
    fn window_display_uses_month_names() {
        let w = DateWindow {
            min: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            max: NaiveDate::from_ymd_opt(2021, 6, 30).unwrap(),
        };
        assert_eq!(w.display(), "Jan 01, 2021 – Jun 30, 2021");
    }
}

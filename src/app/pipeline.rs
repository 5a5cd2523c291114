//! Shared refresh pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ensure snapshot -> parse -> build series -> chart content
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::collections::BTreeMap;

use crate::data::{DataSource, Dataset, Snapshot, SnapshotCache};
use crate::domain::{ChartContent, DateWindow, EntitySeries, RunConfig};
use crate::error::AppError;
use crate::series;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub snapshot: Snapshot,
    pub dataset: Dataset,
    pub series: BTreeMap<String, EntitySeries>,
    pub window: Option<DateWindow>,
    pub chart: ChartContent,
}

/// Execute the full pipeline: daily snapshot (cached), parse, transform.
pub fn run_refresh(config: &RunConfig, source: &dyn DataSource) -> Result<RunOutput, AppError> {
    let mut cache = SnapshotCache::open(&config.data_dir)?;
    let snapshot = cache.ensure_snapshot(config.today(), source)?;
    run_with_snapshot(config, &snapshot)
}

/// Execute the transform over an already-ensured snapshot.
///
/// This is useful for the TUI where we want to re-derive series without
/// re-fetching.
pub fn run_with_snapshot(config: &RunConfig, snapshot: &Snapshot) -> Result<RunOutput, AppError> {
    let dataset = Dataset::from_snapshot(snapshot, config.metric)?;
    Ok(rebuild(config, snapshot, dataset))
}

/// Re-derive series and chart content from an in-memory dataset.
///
/// Pure with respect to I/O; this is the `selection -> renderable data`
/// function the UI shell re-invokes on every selection change.
pub fn rebuild(config: &RunConfig, snapshot: &Snapshot, dataset: Dataset) -> RunOutput {
    let series = series::build_series(&dataset, &config.countries);
    let chart = series::chart_content(&dataset, &series, snapshot.date);
    let window = dataset.date_range();

    RunOutput {
        snapshot: snapshot.clone(),
        dataset,
        series,
        window,
        chart,
    }
}

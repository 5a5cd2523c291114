//! Command-line parsing for the COVID trends dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the cache/transform code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::Metric;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cvd", version, about = "COVID-19 country trends from the OWID daily snapshot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ensure today's snapshot and print per-country series summaries.
    Show(RunArgs),
    /// List the countries available in today's snapshot.
    Countries(RunArgs),
    /// Launch the interactive TUI dashboard.
    ///
    /// This uses the same underlying refresh pipeline as `cvd show`, but
    /// renders the chart in a terminal UI using Ratatui.
    Tui(RunArgs),
}

/// Common options for all commands.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Country to chart (repeat the flag to select several).
    #[arg(short = 'c', long = "country")]
    pub country: Vec<String>,

    /// Tracked metric column.
    #[arg(short = 'm', long, value_enum, default_value_t = Metric::TotalCases)]
    pub metric: Metric,

    /// Dataset source URL (default: COVID_DATA_URL or the OWID CSV).
    #[arg(long)]
    pub url: Option<String>,

    /// Directory for dated snapshots and the download log
    /// (default: COVID_DATA_DIR or `covid_data`).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Treat this date as "today" (the cache key) instead of the system date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Export the selected series to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the chart data (series, markers, title) to JSON.
    #[arg(long = "export-chart", value_name = "JSON")]
    pub export_chart: Option<PathBuf>,
}

//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves configuration (flags, then environment, then defaults)
//! - runs the refresh pipeline
//! - prints reports
//! - writes optional exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Command, RunArgs};
use crate::data::HttpSource;
use crate::domain::{DEFAULT_COUNTRY, DEFAULT_DATA_DIR, DEFAULT_DATA_URL, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `cvd` binary.
pub fn run() -> Result<(), AppError> {
    // We want `cvd` and `cvd -c Italy` to behave like `cvd tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Show(args) => handle_show(args),
        Command::Countries(args) => handle_countries(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_show(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let source = HttpSource::new(&config.data_url);
    let run = pipeline::run_refresh(&config, &source)?;

    println!("{}", crate::report::format_run_summary(&run, &config));

    if let Some(path) = &config.export_results {
        crate::io::export::write_series_csv(path, &run)?;
    }
    if let Some(path) = &config.export_chart {
        crate::io::chart::write_chart_json(path, &run.chart)?;
    }

    Ok(())
}

fn handle_countries(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let source = HttpSource::new(&config.data_url);
    let run = pipeline::run_refresh(&config, &source)?;

    println!("{}", crate::report::format_countries(&run.dataset));
    Ok(())
}

fn handle_tui(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    crate::tui::run(config)
}

/// Resolve the run configuration: flags win, then `.env`/environment,
/// then built-in defaults.
pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    dotenvy::dotenv().ok();

    let data_url = args
        .url
        .clone()
        .or_else(|| std::env::var("COVID_DATA_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATA_URL.to_string());

    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| std::env::var("COVID_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let countries = if args.country.is_empty() {
        vec![DEFAULT_COUNTRY.to_string()]
    } else {
        args.country.clone()
    };

    Ok(RunConfig {
        data_url,
        data_dir,
        metric: args.metric,
        countries,
        date: args.date,
        export_results: args.export.clone(),
        export_chart: args.export_chart.clone(),
    })
}

/// Rewrite argv so `cvd` defaults to `cvd tui`.
///
/// Rules:
/// - `cvd`                      -> `cvd tui`
/// - `cvd -c Italy ...`         -> `cvd tui -c Italy ...`
/// - `cvd --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "countries" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["cvd"])), argv(&["cvd", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["cvd", "-c", "Italy"])),
            argv(&["cvd", "tui", "-c", "Italy"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(argv(&["cvd", "show", "-c", "Italy"])),
            argv(&["cvd", "show", "-c", "Italy"])
        );
        assert_eq!(rewrite_args(argv(&["cvd", "--help"])), argv(&["cvd", "--help"]));
    }

    #[test]
    fn empty_selection_falls_back_to_the_default_country() {
        let args = RunArgs {
            country: vec![],
            metric: crate::domain::Metric::TotalCases,
            url: Some("http://example.invalid/data.csv".to_string()),
            data_dir: Some(PathBuf::from("covid_data")),
            date: None,
            export: None,
            export_chart: None,
        };
        let config = run_config_from_args(&args).unwrap();
        assert_eq!(config.countries, vec![DEFAULT_COUNTRY.to_string()]);
    }
}

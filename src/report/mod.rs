//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the cache/transform code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::data::Dataset;
use crate::domain::RunConfig;

/// Format the full run summary (snapshot info + dataset stats + series).
pub fn format_run_summary(run: &RunOutput, config: &RunConfig) -> String {
    let mut out = String::new();

    out.push_str("=== cvd - COVID-19 country trends ===\n");
    out.push_str(&format!(
        "Snapshot: {} ({})\n",
        run.snapshot.date,
        run.snapshot.path.display()
    ));
    out.push_str(&format!("Metric: {}\n", run.dataset.metric.display_name()));
    match &run.window {
        Some(w) => out.push_str(&format!("Window: {}\n", w.display())),
        None => out.push_str("Window: (no data)\n"),
    }
    out.push_str(&format!(
        "Rows: read={} | used={} | countries={}\n",
        run.dataset.rows_read,
        run.dataset.rows_used(),
        run.dataset.entities().len()
    ));

    out.push_str("\nSelected series:\n");
    for entity in &config.countries {
        let Some(series) = run.series.get(entity) else {
            continue;
        };

        if series.points.is_empty() {
            out.push_str(&format!("  {entity}: (no data)\n"));
            continue;
        }

        // Points are sorted, so last() is the most recent observation.
        let (last_date, last_value) = series.points[series.points.len() - 1];
        out.push_str(&format!(
            "  {entity}: n={} | last {last_date} = {}",
            series.points.len(),
            fmt_value(last_value)
        ));
        match series.last_increase {
            Some((date, value)) => {
                out.push_str(&format!(" | last increase {date} = {}\n", fmt_value(value)));
            }
            None => out.push_str(" | no increase on record\n"),
        }
        if let Some(annotation) = series.annotation() {
            out.push_str(&format!("    {annotation}\n"));
        }
    }

    out
}

/// Format the country list for `cvd countries`.
pub fn format_countries(dataset: &Dataset) -> String {
    let entities = dataset.entities();
    let mut out = format!("Countries in snapshot ({}):\n", entities.len());
    for entity in entities {
        out.push_str(&format!("  {entity}\n"));
    }
    out
}

/// Render a metric value: whole numbers get thousands separators, anything
/// else two decimals.
pub fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        group_thousands(v as i64)
    } else {
        format!("{v:.2}")
    }
}

fn group_thousands(v: i64) -> String {
    let digits = v.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if v < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

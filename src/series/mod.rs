//! Series transform: selection -> chart-ready series.
//!
//! This is the pure half of the system: given the in-memory dataset and a set
//! of selected entities, produce per-entity series plus the derived
//! last-increase marker. Whatever UI shell re-invokes it on selection change
//! gets the same answer for the same inputs.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::data::Dataset;
use crate::domain::{ChartContent, ChartSeries, EntitySeries};

/// Build one `EntitySeries` per requested entity.
///
/// - rows are matched by exact entity name and sorted ascending by date
/// - an entity with zero matching rows maps to an empty series (unknown or
///   renamed entities degrade gracefully, never error)
/// - an empty selection returns an empty mapping
pub fn build_series(dataset: &Dataset, entities: &[String]) -> BTreeMap<String, EntitySeries> {
    let mut out = BTreeMap::new();

    for entity in entities {
        if out.contains_key(entity) {
            continue;
        }

        let mut points: Vec<(NaiveDate, f64)> = dataset
            .rows
            .iter()
            .filter(|r| r.entity == *entity)
            .map(|r| (r.date, r.value))
            .collect();
        points.sort_by_key(|(d, _)| *d);

        let last_increase = last_increase(&points);
        out.insert(
            entity.clone(),
            EntitySeries {
                entity: entity.clone(),
                points,
                last_increase,
            },
        );
    }

    out
}

/// Most recent point whose value strictly exceeds the immediately preceding
/// value, or `None` when the series has fewer than two points or never rises.
///
/// A flat run after an increase does not advance the marker; only a strictly
/// positive delta counts.
pub fn last_increase(points: &[(NaiveDate, f64)]) -> Option<(NaiveDate, f64)> {
    points
        .windows(2)
        .rev()
        .find(|w| w[1].1 > w[0].1)
        .map(|w| w[1])
}

/// Assemble everything the rendering boundary needs for one chart.
///
/// The window in the title covers the entire snapshot, not just the selected
/// entities. `snapshot_date` is the cache day the chart was derived from.
pub fn chart_content(
    dataset: &Dataset,
    series: &BTreeMap<String, EntitySeries>,
    snapshot_date: NaiveDate,
) -> ChartContent {
    let window = dataset.date_range();
    let title = match &window {
        Some(w) => format!(
            "COVID-19 {} ({})",
            dataset.metric.display_name(),
            w.display()
        ),
        None => format!("COVID-19 {} (no data)", dataset.metric.display_name()),
    };

    let series = series
        .values()
        .map(|s| ChartSeries {
            entity: s.entity.clone(),
            points: s.points.clone(),
            last_increase: s.last_increase,
            annotation: s.annotation(),
        })
        .collect();

    ChartContent {
        tool: "cvd".to_string(),
        snapshot_date,
        metric: dataset.metric,
        title,
        window,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Metric;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, d).unwrap()
    }

    fn dataset(rows: &[(&str, NaiveDate, f64)]) -> Dataset {
        Dataset {
            metric: Metric::TotalCases,
            rows: rows
                .iter()
                .map(|(e, d, v)| crate::domain::DatasetRow {
                    entity: e.to_string(),
                    date: *d,
                    value: *v,
                })
                .collect(),
            rows_read: rows.len(),
        }
    }

    #[test]
    fn last_increase_is_the_final_strict_rise() {
        let points = vec![
            (day(1, 1), 100.0),
            (day(1, 2), 150.0),
            (day(1, 3), 150.0),
            (day(1, 4), 140.0),
        ];
        assert_eq!(last_increase(&points), Some((day(1, 2), 150.0)));
    }

    #[test]
    fn flat_or_falling_series_has_no_marker() {
        assert_eq!(last_increase(&[]), None);
        assert_eq!(last_increase(&[(day(1, 1), 5.0)]), None);

        let falling = vec![(day(1, 1), 5.0), (day(1, 2), 5.0), (day(1, 3), 3.0)];
        assert_eq!(last_increase(&falling), None);
    }

    #[test]
    fn marker_moves_with_a_later_rise() {
        let points = vec![
            (day(1, 1), 100.0),
            (day(1, 2), 90.0),
            (day(1, 3), 95.0),
            (day(1, 4), 95.0),
        ];
        assert_eq!(last_increase(&points), Some((day(1, 3), 95.0)));
    }

    #[test]
    fn rows_are_sorted_before_the_scan() {
        let data = dataset(&[
            ("Italy", day(1, 3), 150.0),
            ("Italy", day(1, 1), 100.0),
            ("Italy", day(1, 2), 150.0),
        ]);
        let series = build_series(&data, &["Italy".to_string()]);
        let italy = &series["Italy"];
        assert_eq!(
            italy.points,
            vec![(day(1, 1), 100.0), (day(1, 2), 150.0), (day(1, 3), 150.0)]
        );
        assert_eq!(italy.last_increase, Some((day(1, 2), 150.0)));
    }

    #[test]
    fn unknown_entity_yields_an_empty_series() {
        let data = dataset(&[("Italy", day(1, 1), 1.0)]);
        let series = build_series(&data, &["Atlantis".to_string()]);
        let atlantis = &series["Atlantis"];
        assert!(atlantis.points.is_empty());
        assert_eq!(atlantis.last_increase, None);
        assert_eq!(atlantis.annotation(), None);
    }

    #[test]
    fn empty_selection_yields_an_empty_mapping() {
        let data = dataset(&[("Italy", day(1, 1), 1.0)]);
        assert!(build_series(&data, &[]).is_empty());
    }

    #[test]
    fn duplicate_selections_collapse() {
        let data = dataset(&[("Italy", day(1, 1), 1.0), ("Italy", day(1, 2), 2.0)]);
        let series = build_series(&data, &["Italy".to_string(), "Italy".to_string()]);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn chart_window_ignores_the_selection() {
        let data = dataset(&[
            ("Italy", day(1, 1), 1.0),
            ("France", day(6, 30), 2.0),
            ("Italy", day(2, 1), 3.0),
        ]);
        let series = build_series(&data, &["Italy".to_string()]);
        let content = chart_content(&data, &series, day(7, 1));

        let window = content.window.unwrap();
        assert_eq!(window.min, day(1, 1));
        assert_eq!(window.max, day(6, 30));
        assert_eq!(
            content.title,
            "COVID-19 Total Cases (Jan 01, 2021 – Jun 30, 2021)"
        );
    }

    #[test]
    fn chart_series_carry_annotations() {
        let data = dataset(&[("Italy", day(1, 1), 1.0), ("Italy", day(1, 2), 2.0)]);
        let series = build_series(&data, &["Italy".to_string()]);
        let content = chart_content(&data, &series, day(1, 3));
        assert_eq!(content.series.len(), 1);
        assert_eq!(
            content.series[0].annotation.as_deref(),
            Some("Reporting stopped for Italy")
        );
    }
}

//! Plotters-powered trend chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - easy to extend later (legend, annotations, exportable PNG/SVG backends, etc.)
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One line on the chart: entity label plus (day-offset, value) points.
#[derive(Debug, Clone)]
pub struct TrendLine {
    pub entity: String,
    pub points: Vec<(f64, f64)>,
}

/// A lightweight, render-only chart description.
///
/// The widget is intentionally data-driven: all series and bounds are computed
/// outside the render call. This keeps `render()` focused on drawing and makes
/// it easy to test/benchmark the data prep separately.
pub struct TrendChart<'a> {
    /// One line series per selected country.
    pub lines: &'a [TrendLine],
    /// Last-increase markers, one per line that has one.
    pub markers: &'a [(f64, f64)],
    /// X bounds (days since `epoch`).
    pub x_bounds: [f64; 2],
    /// Y bounds (metric units).
    pub y_bounds: [f64; 2],
    /// Date at x = 0, used to format tick labels.
    pub epoch: NaiveDate,
    /// Y axis label (the tracked metric).
    pub y_label: String,
}

/// High-contrast line palette for terminal rendering, cycled per series.
const PALETTE: [RGBColor; 6] = [
    RGBColor(0, 255, 255),
    RGBColor(0, 255, 0),
    RGBColor(255, 255, 0),
    RGBColor(255, 0, 255),
    RGBColor(0, 128, 255),
    RGBColor(255, 128, 0),
];

impl Widget for TrendChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite())
            || x1 <= x0
            || y1 <= y0
        {
            return;
        }

        let epoch = self.epoch;

        // `plotters-ratatui-backend` draws Plotters primitives via Ratatui's
        // `Canvas` widget, which ultimately writes to the terminal buffer.
        //
        // We delegate rendering to the crate-provided widget helper to avoid
        // coupling our code to its internal backend types.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Small margins keep the chart readable without wasting space.
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 9)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Axes + tick labels.
            //
            // We disable the mesh lines to reduce visual clutter in low-resolution
            // terminal rendering; the axes + labels are usually enough here.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_axis_date(epoch, *v))
                .y_label_formatter(&|v| fmt_axis_value(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // 1) One line per country, palette cycled.
            for (idx, line) in self.lines.iter().enumerate() {
                let color = PALETTE[idx % PALETTE.len()];
                chart.draw_series(LineSeries::new(line.points.iter().copied(), &color))?;
            }

            // 2) Last-increase markers.
            //
            // We intentionally avoid `Circle` markers here. The underlying
            // `plotters-ratatui-backend` currently maps circle radii incorrectly
            // (pixel radius -> normalized canvas units), producing huge circles.
            //
            // A red `Pixel` gives a clean "dot" that reliably overrides the
            // series line underneath it.
            let marker_color = RGBColor(255, 0, 0);
            chart.draw_series(
                self.markers
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), marker_color)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Ratatui color matching the Plotters line palette, for legend swatches.
pub fn line_color(idx: usize) -> Color {
    let c = PALETTE[idx % PALETTE.len()];
    Color::Rgb(c.0, c.1, c.2)
}

fn fmt_axis_date(epoch: NaiveDate, v: f64) -> String {
    let date = epoch + Duration::days(v.round() as i64);
    date.format("%b %d").to_string()
}

fn fmt_axis_value(v: f64) -> String {
    if v.abs() >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if v.abs() >= 1_000.0 {
        format!("{:.1}k", v / 1_000.0)
    } else {
        format!("{v:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_labels_are_compact() {
        assert_eq!(fmt_axis_value(120.0), "120");
        assert_eq!(fmt_axis_value(4_500.0), "4.5k");
        assert_eq!(fmt_axis_value(33_000_000.0), "33.0M");

        let epoch = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(fmt_axis_date(epoch, 0.0), "Jan 01");
        assert_eq!(fmt_axis_date(epoch, 31.0), "Feb 01");
    }
}

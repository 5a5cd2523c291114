//! Ratatui-based terminal UI.
//!
//! The TUI is the dashboard shell: a multi-select country list on the left,
//! the trend chart on the right, and a legend panel listing the last-increase
//! annotations. Selection changes re-run the pure transform over the
//! in-memory snapshot; only the daily refresh touches the network.

use std::collections::BTreeSet;
use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::{self, RunOutput};
use crate::data::{Dataset, HttpSource, Snapshot, SnapshotCache};
use crate::domain::{ChartContent, RunConfig};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{TrendChart, TrendLine, line_color};

/// Start the TUI.
pub fn run(config: RunConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!(
                "Failed to enter alternate screen: {e}"
            )));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: RunConfig,
    cache: SnapshotCache,
    source: HttpSource,
    snapshot: Option<Snapshot>,
    dataset: Option<Dataset>,
    run: Option<RunOutput>,
    /// All entities in the snapshot, sorted (the dropdown's option list).
    countries: Vec<String>,
    selected: BTreeSet<String>,
    cursor: usize,
    filter: String,
    editing_filter: bool,
    status: String,
}

impl App {
    fn new(config: RunConfig) -> Result<Self, AppError> {
        let cache = SnapshotCache::open(&config.data_dir)?;
        let source = HttpSource::new(&config.data_url);
        let selected = config.countries.iter().cloned().collect();
        let mut app = Self {
            config,
            cache,
            source,
            snapshot: None,
            dataset: None,
            run: None,
            countries: Vec::new(),
            selected,
            cursor: 0,
            filter: String::new(),
            editing_filter: false,
            status: "Checking today's snapshot...".to_string(),
        };
        app.refresh_snapshot()?;
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        if self.editing_filter {
            return self.handle_filter_edit(code);
        }

        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                let n = self.visible_countries().len();
                if n > 0 && self.cursor + 1 < n {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current(),
            KeyCode::Char('m') => {
                self.config.metric = self.config.metric.next();
                self.reparse()?;
                self.status = format!("metric: {}", self.config.metric.display_name());
            }
            KeyCode::Char('r') => {
                // A failed re-check should not take the dashboard down.
                if let Err(err) = self.refresh_snapshot() {
                    self.status = format!("Refresh failed: {err}");
                }
            }
            KeyCode::Char('/') => {
                self.editing_filter = true;
                self.status = "Filtering countries. Enter to apply, Esc to clear.".to_string();
            }
            KeyCode::Char('e') => {
                if let Err(err) = self.export_chart() {
                    self.status = format!("Export failed: {err}");
                }
            }
            _ => {}
        }

        Ok(false)
    }

    fn handle_filter_edit(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Esc => {
                self.filter.clear();
                self.editing_filter = false;
                self.cursor = 0;
                self.status = "Filter cleared.".to_string();
            }
            KeyCode::Enter => {
                self.editing_filter = false;
                self.status = format!("filter: {}", self.filter);
            }
            KeyCode::Backspace => {
                self.filter.pop();
                self.cursor = 0;
            }
            KeyCode::Char(c) => {
                self.filter.push(c);
                self.cursor = 0;
            }
            _ => {}
        }
        Ok(false)
    }

    fn toggle_current(&mut self) {
        let visible = self.visible_countries();
        let Some(name) = visible.get(self.cursor) else {
            return;
        };
        if !self.selected.remove(name) {
            self.selected.insert(name.clone());
        }
        self.rebuild();
        self.status = format!("selected: {}", self.selected.len());
    }

    fn refresh_snapshot(&mut self) -> Result<(), AppError> {
        self.status = "Checking today's snapshot...".to_string();
        let today = self.config.today();
        let cached = self.cache.log().contains(today);
        let snapshot = self.cache.ensure_snapshot(today, &self.source)?;
        self.snapshot = Some(snapshot);
        self.status = if cached {
            format!("Snapshot {today} already cached.")
        } else {
            format!("Downloaded snapshot {today}.")
        };
        self.reparse()
    }

    fn reparse(&mut self) -> Result<(), AppError> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(());
        };
        let dataset = Dataset::from_snapshot(snapshot, self.config.metric)?;
        self.countries = dataset.entities();
        self.dataset = Some(dataset);
        let n = self.visible_countries().len();
        if self.cursor >= n {
            self.cursor = 0;
        }
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        let (Some(snapshot), Some(dataset)) = (&self.snapshot, &self.dataset) else {
            return;
        };
        let mut config = self.config.clone();
        config.countries = self.selected.iter().cloned().collect();
        self.run = Some(pipeline::rebuild(&config, snapshot, dataset.clone()));
    }

    fn export_chart(&mut self) -> Result<(), AppError> {
        let (Some(run), Some(snapshot)) = (&self.run, &self.snapshot) else {
            self.status = "No chart to export yet.".to_string();
            return Ok(());
        };
        let path = match &self.config.export_chart {
            Some(path) => path.clone(),
            None => self
                .cache
                .data_dir()
                .join(format!("chart_{}.json", snapshot.date)),
        };
        crate::io::chart::write_chart_json(&path, &run.chart)?;
        self.status = format!("Wrote chart JSON: {}", path.display());
        Ok(())
    }

    fn visible_countries(&self) -> Vec<String> {
        let needle = self.filter.to_lowercase();
        self.countries
            .iter()
            .filter(|c| needle.is_empty() || c.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("cvd", Style::default().fg(Color::Cyan)),
            Span::raw(" — COVID-19 country trends"),
        ]));

        let snapshot_date = self
            .snapshot
            .as_ref()
            .map(|s| s.date.to_string())
            .unwrap_or_else(|| "-".to_string());
        let window = self
            .run
            .as_ref()
            .and_then(|r| r.window.as_ref())
            .map(|w| w.display())
            .unwrap_or_else(|| "-".to_string());

        lines.push(Line::from(Span::styled(
            format!(
                "metric: {} | snapshot: {snapshot_date} | window: {window} | selected: {}/{}",
                self.config.metric.display_name(),
                self.selected.len(),
                self.countries.len(),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);

        self.draw_countries(frame, chunks[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(7)])
            .split(chunks[1]);

        let prep = self.run.as_ref().and_then(|r| chart_series(&r.chart));
        self.draw_chart(frame, right[0], prep.as_ref());
        self.draw_legend(frame, right[1]);
    }

    fn draw_countries(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let visible = self.visible_countries();
        let items: Vec<ListItem> = visible
            .iter()
            .map(|name| {
                let mark = if self.selected.contains(name) {
                    "[x] "
                } else {
                    "[ ] "
                };
                ListItem::new(format!("{mark}{name}"))
            })
            .collect();

        let title = if self.filter.is_empty() {
            "Countries".to_string()
        } else {
            format!("Countries (/{})", self.filter)
        };

        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        if !visible.is_empty() {
            state.select(Some(self.cursor.min(visible.len() - 1)));
        }
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing_filter {
            let hint = Paragraph::new("Typing filter…").style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, prep: Option<&ChartPrep>) {
        let title = self
            .run
            .as_ref()
            .map(|r| r.chart.title.clone())
            .unwrap_or_else(|| "Chart".to_string());
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if self.run.is_none() {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        }

        let Some(prep) = prep else {
            let msg = Paragraph::new("No data for the current selection.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let widget = TrendChart {
            lines: &prep.lines,
            markers: &prep.markers,
            x_bounds: prep.x_bounds,
            y_bounds: prep.y_bounds,
            epoch: prep.epoch,
            y_label: self.config.metric.display_name().to_string(),
        };
        frame.render_widget(widget, inner);
    }

    fn draw_legend(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();

        if let Some(run) = &self.run {
            // Palette indices follow the drawn line order, which is the sorted
            // series order, counting only non-empty series.
            let mut line_idx = 0usize;
            for series in &run.chart.series {
                if series.points.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("  {}: no data in snapshot", series.entity),
                        Style::default().fg(Color::DarkGray),
                    )));
                    continue;
                }

                let swatch = Span::styled("■ ", Style::default().fg(line_color(line_idx)));
                line_idx += 1;

                let text = match (series.last_increase, &series.annotation) {
                    (Some((date, value)), Some(annotation)) => format!(
                        "{annotation} — {} ({})",
                        date.format("%b %d, %Y"),
                        crate::report::fmt_value(value),
                    ),
                    _ => format!("{}: no increase on record", series.entity),
                };
                lines.push(Line::from(vec![swatch, Span::raw(text)]));
            }
        }

        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "Select a country to chart it.",
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Markers").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ move  space select  / filter  m metric  r refresh  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart-ready series in screen coordinates (days since epoch, value).
struct ChartPrep {
    lines: Vec<TrendLine>,
    markers: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    epoch: NaiveDate,
}

/// Project chart content onto numeric axes for Plotters.
///
/// X spans the dataset-wide window (so two charts over the same snapshot
/// line up regardless of selection); Y spans the selected series with a
/// small pad.
fn chart_series(chart: &ChartContent) -> Option<ChartPrep> {
    let window = chart.window?;
    let epoch = window.min;
    let to_x = |d: NaiveDate| (d - epoch).num_days() as f64;

    let mut lines = Vec::new();
    let mut markers = Vec::new();
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for series in &chart.series {
        if series.points.is_empty() {
            continue;
        }
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|&(d, v)| (to_x(d), v))
            .collect();
        for &(_, y) in &points {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if let Some((d, v)) = series.last_increase {
            markers.push((to_x(d), v));
        }
        lines.push(TrendLine {
            entity: series.entity.clone(),
            points,
        });
    }

    if lines.is_empty() {
        return None;
    }

    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    } else if (y_max - y_min).abs() < 1e-9 {
        // A flat selection still deserves a visible line.
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    let x_max = to_x(window.max).max(1.0);

    Some(ChartPrep {
        lines,
        markers,
        x_bounds: [0.0, x_max],
        y_bounds: [y_min - pad, y_max + pad],
        epoch,
    })
}

//! Ratatui-based terminal dashboard.
//!
//! The sidebar holds the filter toggles (pollsters, methodology buckets, date
//! range, parties). Every change rebuilds the `FilterRequest`, reruns the view
//! pipeline and redraws the margin chart and summary panels.

use std::collections::BTreeSet;
use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::aggregate::{
    DEFAULT_HISTOGRAM_BINS, GroupSummary, HistogramBin, counts_desc, party_histogram, restrict_to,
};
use crate::app::pipeline::{ViewOutput, run_view};
use crate::domain::{Methodology, Party, PollDataset, PollRecord};
use crate::error::AppError;
use crate::filter::{DateRange, FilterRequest, SeriesSelection};
use crate::report::format::{fmt_opt, truncate};

mod plotters_chart;

use plotters_chart::TimeSeriesChart;

/// Start the TUI over an already-prepared dataset.
pub fn run(dataset: &PollDataset, request: FilterRequest) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(dataset, request);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
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

/// One selectable row of the sidebar.
#[derive(Debug, Clone, PartialEq)]
enum SidebarItem {
    Pollster(String),
    Methodology(Methodology),
    From,
    To,
    Party(Party),
}

/// Row order of the pollster and methodology panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupOrder {
    MeanMargin,
    Count,
    Selection,
}

impl GroupOrder {
    fn next(self) -> Self {
        match self {
            GroupOrder::MeanMargin => GroupOrder::Count,
            GroupOrder::Count => GroupOrder::Selection,
            GroupOrder::Selection => GroupOrder::MeanMargin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateField {
    From,
    To,
}

struct App<'a> {
    dataset: &'a PollDataset,
    request: FilterRequest,
    pollster_options: Vec<String>,
    methodology_options: Vec<Methodology>,
    selected: usize,
    editing: Option<DateField>,
    date_input: String,
    status: String,
    group_order: GroupOrder,
    show_histogram: bool,
    out: ViewOutput<'a>,
}

impl<'a> App<'a> {
    fn new(dataset: &'a PollDataset, request: FilterRequest) -> Self {
        let out = run_view(dataset, &request);
        let status = format!("Loaded {} polls from {}", dataset.len(), dataset.source.display());
        Self {
            dataset,
            pollster_options: dataset.pollsters(),
            methodology_options: dataset.methodologies(),
            request,
            selected: 0,
            editing: None,
            date_input: String::new(),
            status,
            group_order: GroupOrder::MeanMargin,
            show_histogram: false,
            out,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
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

    fn sidebar_items(&self) -> Vec<SidebarItem> {
        let mut items: Vec<SidebarItem> = self
            .pollster_options
            .iter()
            .cloned()
            .map(SidebarItem::Pollster)
            .collect();
        items.extend(self.methodology_options.iter().copied().map(SidebarItem::Methodology));
        items.push(SidebarItem::From);
        items.push(SidebarItem::To);
        items.extend(Party::ALL.into_iter().map(SidebarItem::Party));
        items
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_date_edit(code);
            return false;
        }

        let n_items = self.sidebar_items().len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < n_items {
                    self.selected += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.activate_selected(),
            KeyCode::Char('c') => self.group_order = self.group_order.next(),
            KeyCode::Char('h') => self.show_histogram = !self.show_histogram,
            KeyCode::Char('a') => {
                self.request = FilterRequest::all_of(self.dataset);
                self.refresh();
                self.status = "Reset to all selections.".to_string();
            }
            _ => {}
        }
        false
    }

    fn activate_selected(&mut self) {
        let Some(item) = self.sidebar_items().get(self.selected).cloned() else {
            return;
        };

        match item {
            SidebarItem::Pollster(name) => {
                let all = &self.pollster_options;
                let mut set = self
                    .request
                    .pollsters
                    .clone()
                    .unwrap_or_else(|| all.iter().cloned().collect());
                toggle(&mut set, name.clone());
                self.request.pollsters = Some(set);
                self.status = format!("pollster: {name}");
            }
            SidebarItem::Methodology(m) => {
                let all = &self.methodology_options;
                let mut set = self
                    .request
                    .methodologies
                    .clone()
                    .unwrap_or_else(|| all.iter().copied().collect());
                toggle(&mut set, m);
                self.request.methodologies = Some(set);
                self.status = format!("methodology: {m}");
            }
            SidebarItem::From => {
                self.editing = Some(DateField::From);
                self.status = "Editing start (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
            }
            SidebarItem::To => {
                self.editing = Some(DateField::To);
                self.status = "Editing end (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
            }
            SidebarItem::Party(p) => {
                self.request.parties = self.request.parties.toggled(p);
                self.status = format!("party: {p}");
            }
        }
        self.refresh();
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.date_input.clear();
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                if let Some(field) = self.editing.take() {
                    self.apply_date_input(field);
                }
                self.date_input.clear();
            }
            KeyCode::Backspace => {
                self.date_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' {
                    self.date_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn apply_date_input(&mut self, field: DateField) {
        let trimmed = self.date_input.trim();
        let date = match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                self.status = format!("Invalid date '{trimmed}': {e}");
                return;
            }
        };

        let bounds = self
            .request
            .date_range
            .or_else(|| self.dataset.date_bounds().map(|(lo, hi)| DateRange::new(lo, hi)))
            .unwrap_or(DateRange::new(date, date));
        self.request.date_range = Some(match field {
            DateField::From => DateRange::new(date, bounds.hi),
            DateField::To => DateRange::new(bounds.lo, date),
        });
        self.refresh();
        self.status = format!("date range: {}", fmt_range(self.request.date_range));
    }

    fn refresh(&mut self) {
        self.out = run_view(self.dataset, &self.request);
        debug!("view has {} rows", self.out.view.len());
    }

    fn is_checked(&self, item: &SidebarItem) -> bool {
        match item {
            SidebarItem::Pollster(p) => self.request.pollsters.as_ref().is_none_or(|s| s.contains(p)),
            SidebarItem::Methodology(m) => self.request.methodologies.as_ref().is_none_or(|s| s.contains(m)),
            SidebarItem::Party(p) => self.request.parties.contains(*p),
            SidebarItem::From | SidebarItem::To => true,
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("polls", Style::default().fg(Color::Cyan)),
            Span::raw(" - generic ballot dashboard"),
        ]));

        let kpis = match &self.out.stats {
            Some(s) => format!(
                "n={} | {} → {} | mean margin {} | 7-poll avg {}{}",
                s.rows,
                s.first_date,
                s.last_date,
                fmt_opt(s.mean_margin),
                fmt_opt(s.latest_margin_roll7),
                if self.dataset.has_predicted_margin {
                    format!(" | predicted {}", fmt_opt(s.latest_predicted_margin))
                } else {
                    String::new()
                },
            ),
            None => "No polls match the current filters.".to_string(),
        };
        lines.push(Line::from(Span::styled(kpis, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);
        self.draw_sidebar(frame, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(10)])
            .split(columns[1]);
        self.draw_chart(frame, rows[0]);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ])
            .split(rows[1]);
        self.draw_pollsters(frame, panels[0]);
        self.draw_methodologies(frame, panels[1]);
        self.draw_distribution(frame, panels[2]);
    }

    fn draw_sidebar(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .sidebar_items()
            .iter()
            .map(|item| {
                let mark = if self.is_checked(item) { "[x]" } else { "[ ]" };
                let label = match item {
                    SidebarItem::Pollster(p) => format!("{mark} {p}"),
                    SidebarItem::Methodology(m) => format!("{mark} method: {m}"),
                    SidebarItem::From => format!(
                        "from: {}",
                        self.request.date_range.map(|r| r.lo.to_string()).unwrap_or_else(|| "-".to_string())
                    ),
                    SidebarItem::To => format!(
                        "to:   {}",
                        self.request.date_range.map(|r| r.hi.to_string()).unwrap_or_else(|| "-".to_string())
                    ),
                    SidebarItem::Party(p) => format!("{mark} party: {p}"),
                };
                ListItem::new(label)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Filters").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);

        if let Some(field) = self.editing {
            let label = match field {
                DateField::From => "from",
                DateField::To => "to",
            };
            let hint = Paragraph::new(format!("{label}: {}_", self.date_input))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            let rect = Rect {
                x: area.x + 1,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(2),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(series) = chart_series(&self.out) else {
            let block = Block::default().title("Poll margin over time (dem - rep)").borders(Borders::ALL);
            let msg = Paragraph::new("No polls match the current filters.")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        };

        let panels = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let margin = series.margin_bounds.map(|y_bounds| TimeSeriesChart {
            points: &series.points,
            rolling: &series.rolling,
            predicted: series.predicted.as_deref(),
            parties: &[],
            x_bounds: series.x_bounds,
            y_bounds,
            x_label: "start date",
            y_label: "margin (pts)",
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_pts,
        });
        render_chart_panel(
            frame,
            panels[0],
            "Poll margin over time (dem - rep)",
            margin,
            "No margin data for the current filters.",
        );

        let support = match &self.out.series {
            SeriesSelection::NoneSelected => None,
            SeriesSelection::Selected(_) => series.support_bounds.map(|y_bounds| TimeSeriesChart {
                points: &[],
                rolling: &[],
                predicted: None,
                parties: &series.parties,
                x_bounds: series.x_bounds,
                y_bounds,
                x_label: "start date",
                y_label: "support (7-poll avg)",
                fmt_x: fmt_axis_date,
                fmt_y: fmt_axis_level,
            }),
        };
        let empty = match self.out.series {
            SeriesSelection::NoneSelected => "No party selected.",
            SeriesSelection::Selected(_) => "No support data for the current filters.",
        };
        render_chart_panel(frame, panels[1], "Party support (7-poll avg)", support, empty);
    }

    /// Pollster summaries in the current panel order.
    fn ordered_pollsters(&self) -> Vec<GroupSummary<String>> {
        match self.group_order {
            GroupOrder::MeanMargin => self.out.pollsters.clone(),
            GroupOrder::Count => counts_desc(&self.out.pollsters),
            GroupOrder::Selection => {
                let keys: Vec<String> = match &self.request.pollsters {
                    Some(selected) => selected.iter().cloned().collect(),
                    None => self.pollster_options.clone(),
                };
                restrict_to(&self.out.pollsters, &keys)
            }
        }
    }

    /// Methodology summaries in the current panel order.
    fn ordered_methodologies(&self) -> Vec<GroupSummary<Methodology>> {
        match self.group_order {
            GroupOrder::MeanMargin => self.out.methodologies.clone(),
            GroupOrder::Count => counts_desc(&self.out.methodologies),
            GroupOrder::Selection => {
                let keys: Vec<Methodology> = match &self.request.methodologies {
                    Some(selected) => selected.iter().copied().collect(),
                    None => self.methodology_options.clone(),
                };
                restrict_to(&self.out.methodologies, &keys)
            }
        }
    }

    fn group_title(&self, what: &str) -> String {
        match self.group_order {
            GroupOrder::MeanMargin => format!("{what} avg margin"),
            GroupOrder::Count => format!("{what} by poll count"),
            GroupOrder::Selection => format!("Selected {what}"),
        }
    }

    fn draw_pollsters(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = group_lines(&self.ordered_pollsters(), |k| k.clone());
        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title(self.group_title("pollsters")).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_methodologies(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = group_lines(&self.ordered_methodologies(), |k| k.to_string());
        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title(self.group_title("methods")).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_distribution(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let parties = match &self.out.series {
            SeriesSelection::NoneSelected => {
                let p = Paragraph::new(Line::from(Span::styled(
                    "No party selected.",
                    Style::default().fg(Color::Yellow),
                )))
                .block(Block::default().title("Support").borders(Borders::ALL));
                frame.render_widget(p, area);
                return;
            }
            SeriesSelection::Selected(parties) => parties,
        };

        let (lines, title): (Vec<Line>, &str) = if self.show_histogram {
            // Inner width minus the "dem 12.3 " prefix.
            let bar_width = usize::from(area.width.saturating_sub(14)).max(1);
            let rows_per_party = usize::from(area.height.saturating_sub(2)) / parties.len().max(1);
            let bins = DEFAULT_HISTOGRAM_BINS.min(rows_per_party).max(1);
            let lines = parties
                .iter()
                .flat_map(|&party| {
                    histogram_lines(party, &party_histogram(&self.out.view, party, bins), bar_width)
                })
                .collect();
            (lines, "Support histogram")
        } else {
            let lines = self
                .out
                .distributions
                .iter()
                .map(|d| {
                    let band = d
                        .band()
                        .map(|(lo, mean, hi)| format!("{lo:.1} | {mean:.1} | {hi:.1}"))
                        .unwrap_or_else(|| "-".to_string());
                    Line::from(format!("{} n={} {band}", d.party, d.n))
                })
                .collect();
            (lines, "Support mean ±1 std")
        };
        let p = Paragraph::new(Text::from(lines)).block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  space toggle/edit  c order  h histogram  a reset  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if set.contains(&value) {
        set.remove(&value);
    } else {
        set.insert(value);
    }
}

fn group_lines<K>(rows: &[GroupSummary<K>], label: impl Fn(&K) -> String) -> Vec<Line<'static>> {
    rows.iter()
        .map(|g| {
            let color = match g.mean_margin {
                Some(m) if m > 0.0 => Color::Blue,
                Some(m) if m < 0.0 => Color::Red,
                _ => Color::Gray,
            };
            Line::from(vec![
                Span::raw(format!("{:<18} {:>4} ", truncate(&label(&g.key), 18), g.count)),
                Span::styled(fmt_opt(g.mean_margin), Style::default().fg(color)),
            ])
        })
        .collect()
}

fn render_chart_panel(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    chart: Option<TimeSeriesChart<'_>>,
    empty: &str,
) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    match chart {
        Some(widget) => frame.render_widget(widget, inner),
        None => {
            let msg = Paragraph::new(empty.to_string()).style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
        }
    }
}

fn histogram_lines(party: Party, bins: &[HistogramBin], width: usize) -> Vec<Line<'static>> {
    let max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let color = match party {
        Party::Dem => Color::Blue,
        Party::Rep => Color::Red,
    };
    bins.iter()
        .map(|b| {
            let len = b.count * width / max;
            Line::from(vec![
                Span::raw(format!("{party} {:>5.1} ", b.lo)),
                Span::styled("█".repeat(len), Style::default().fg(color)),
            ])
        })
        .collect()
}

/// Series prepared for the Plotters charts. x is days since the common era.
struct ChartSeries {
    points: Vec<(f64, f64)>,
    rolling: Vec<(f64, f64)>,
    predicted: Option<Vec<(f64, f64)>>,
    /// Rolling support per selected party; empty when no party is selected.
    parties: Vec<(Party, Vec<(f64, f64)>)>,
    x_bounds: [f64; 2],
    margin_bounds: Option<[f64; 2]>,
    support_bounds: Option<[f64; 2]>,
}

/// `None` for an empty view.
fn chart_series(out: &ViewOutput<'_>) -> Option<ChartSeries> {
    let x_of = |d: NaiveDate| f64::from(chrono::Datelike::num_days_from_ce(&d));
    let collect = |value: &dyn Fn(&PollRecord) -> Option<f64>| -> Vec<(f64, f64)> {
        out.view
            .iter()
            .filter_map(|r| Some((x_of(r.start_date), value(r)?)))
            .collect()
    };

    let (first, last) = out.view.date_bounds()?;
    let (mut x0, mut x1) = (x_of(first), x_of(last));
    if x1 <= x0 {
        x0 -= 1.0;
        x1 += 1.0;
    }

    let points = collect(&|r: &PollRecord| r.margin);
    let rolling = collect(&|r: &PollRecord| r.margin_roll7);
    let predicted = out
        .view
        .dataset()
        .has_predicted_margin
        .then(|| collect(&|r: &PollRecord| r.predicted_margin));
    let parties: Vec<(Party, Vec<(f64, f64)>)> = out
        .series
        .parties()
        .iter()
        .map(|&party| (party, collect(&|r: &PollRecord| party.rolling(r))))
        .collect();

    let margin_bounds = y_bounds(
        points
            .iter()
            .chain(rolling.iter())
            .chain(predicted.iter().flatten())
            .map(|&(_, y)| y),
    );
    let support_bounds = y_bounds(parties.iter().flat_map(|(_, line)| line.iter().map(|&(_, y)| y)));

    Some(ChartSeries {
        points,
        rolling,
        predicted,
        parties,
        x_bounds: [x0, x1],
        margin_bounds,
        support_bounds,
    })
}

/// Padded min/max of the values; `None` when there are none.
fn y_bounds(values: impl Iterator<Item = f64>) -> Option<[f64; 2]> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if !(lo.is_finite() && hi.is_finite()) {
        return None;
    }
    let pad = ((hi - lo).abs() * 0.05).max(0.5);
    Some([lo - pad, hi + pad])
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_axis_pts(v: f64) -> String {
    format!("{v:+.1}")
}

fn fmt_axis_level(v: f64) -> String {
    format!("{v:.1}")
}

fn fmt_range(range: Option<DateRange>) -> String {
    match range {
        Some(r) if r.lo > r.hi => format!("{} → {} (empty)", r.lo, r.hi),
        Some(r) => format!("{} → {}", r.lo, r.hi),
        None => "all".to_string(),
    }
}

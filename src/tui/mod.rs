//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing the source, pair, history
//! length, forecast horizon and moving-average window, then renders the
//! forecast and recent history as tables.
//!
//! Changing the source, pair or history length re-fetches the series. Changing
//! the window or horizon only recomputes from the series already in memory.

use std::io;
use std::time::Duration;

use chrono::{Days, Local, NaiveDate};
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
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
};

use crate::app::pipeline::{self, RunOutput};
use crate::cli::TuiArgs;
use crate::data::{RateSource, SourceSettings, open_source};
use crate::domain::{FOREX_SYMBOLS, ForecastConfig, RateSeries, SourceKind, Symbol};
use crate::error::{AppError, EXIT_SOURCE, ForecastError};
use crate::series::build_series_parallel;

/// Parallel lookups used when (re)fetching the history.
const FETCH_JOBS: usize = 4;
const MIN_HISTORY_DAYS: u32 = 2;
const MAX_HISTORY_DAYS: u32 = 730;
const MAX_HORIZON_DAYS: usize = 30;
const HISTORY_ROWS: usize = 30;

/// Start the TUI.
pub fn run(args: TuiArgs, settings: SourceSettings) -> Result<(), AppError> {
    let source = open_source(args.source, &settings)?;
    let mut app = App::new(args, settings, source, Local::now().date_naive());
    app.refetch();

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_SOURCE, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(EXIT_SOURCE, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(EXIT_SOURCE, format!("Failed to enter alternate screen: {e}")));
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Source,
    Base,
    Target,
    HistoryDays,
    Horizon,
    Window,
}

impl Field {
    const ALL: [Field; 6] = [
        Field::Source,
        Field::Base,
        Field::Target,
        Field::HistoryDays,
        Field::Horizon,
        Field::Window,
    ];

    fn is_symbol(self) -> bool {
        matches!(self, Field::Base | Field::Target)
    }
}

struct App {
    settings: SourceSettings,
    source_kind: SourceKind,
    source: Box<dyn RateSource>,
    base: Symbol,
    target: Symbol,
    today: NaiveDate,
    history_days: u32,
    horizon_days: usize,
    window: usize,
    selected_field: usize,
    editing_symbol: bool,
    symbol_input: String,
    status: String,
    series: Option<RateSeries>,
    latest: Option<f64>,
    run: Option<RunOutput>,
}

impl App {
    fn new(args: TuiArgs, settings: SourceSettings, source: Box<dyn RateSource>, today: NaiveDate) -> Self {
        let horizon_days = usize::from(args.days);
        Self {
            settings,
            source_kind: args.source,
            source,
            base: args.base,
            target: args.target,
            today,
            history_days: args.history_days,
            horizon_days,
            window: horizon_days,
            selected_field: 0,
            editing_symbol: false,
            symbol_input: String::new(),
            status: String::new(),
            series: None,
            latest: None,
            run: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_SOURCE, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_SOURCE, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(EXIT_SOURCE, format!("Event read error: {e}")))? {
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

    fn field(&self) -> Field {
        Field::ALL[self.selected_field]
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_symbol {
            self.handle_symbol_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < Field::ALL.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => {
                if self.field().is_symbol() {
                    self.editing_symbol = true;
                    self.symbol_input.clear();
                    self.status = "Type a symbol. Enter to apply, Esc to cancel.".to_string();
                }
            }
            KeyCode::Char('s') => {
                std::mem::swap(&mut self.base, &mut self.target);
                self.refetch();
            }
            KeyCode::Char('r') => self.refetch(),
            _ => {}
        }

        false
    }

    fn handle_symbol_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_symbol = false;
                self.status = "Symbol edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing_symbol = false;
                self.apply_symbol_input();
            }
            KeyCode::Backspace => {
                self.symbol_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_alphanumeric() || c == '-' {
                    self.symbol_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn apply_symbol_input(&mut self) {
        let symbol = match Symbol::new(&self.symbol_input) {
            Ok(s) => s,
            Err(err) => {
                self.status = format!("{err}");
                return;
            }
        };
        match self.field() {
            Field::Base => self.base = symbol,
            Field::Target => self.target = symbol,
            _ => return,
        }
        self.refetch();
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.field() {
            Field::Source => {
                let kind = if delta >= 0 {
                    self.source_kind.next()
                } else {
                    self.source_kind.prev()
                };
                self.switch_source(kind);
            }
            Field::Base => {
                self.base = cycle_symbol(&self.base, self.source_kind.symbol_choices(), delta);
                self.refetch();
            }
            Field::Target => {
                self.target = cycle_symbol(&self.target, &FOREX_SYMBOLS, delta);
                self.refetch();
            }
            Field::HistoryDays => {
                self.history_days = step_u32(self.history_days, delta, 10, MIN_HISTORY_DAYS, MAX_HISTORY_DAYS);
                self.refetch();
            }
            Field::Horizon => {
                self.horizon_days = step_usize(self.horizon_days, delta, 1, MAX_HORIZON_DAYS);
                self.recompute();
            }
            Field::Window => {
                let max = self.history_days as usize;
                self.window = step_usize(self.window, delta, 1, max);
                self.recompute();
            }
        }
    }

    fn switch_source(&mut self, kind: SourceKind) {
        let source = match open_source(kind, &self.settings) {
            Ok(s) => s,
            Err(err) => {
                self.status = format!("{}: {err}", kind.display_name());
                return;
            }
        };
        // Forex and crypto symbols don't mix; start from a sensible pair.
        if kind.symbol_choices() != self.source_kind.symbol_choices() {
            let (base, target) = default_pair(kind);
            self.base = base;
            self.target = target;
        }
        self.source_kind = kind;
        self.source = source;
        self.refetch();
    }

    fn config(&self) -> ForecastConfig {
        let (start, end) = history_range(self.today, self.history_days);
        ForecastConfig {
            source: self.source_kind,
            base: self.base.clone(),
            target: self.target.clone(),
            start,
            end,
            horizon_days: self.horizon_days,
            window: self.window,
            jobs: FETCH_JOBS,
            history_rows: HISTORY_ROWS,
            export_csv: None,
            export_json: None,
        }
    }

    /// Fetch the series and latest quote for the current settings.
    fn refetch(&mut self) {
        let config = self.config();
        let series = build_series_parallel(
            self.source.as_ref(),
            &config.base,
            &config.target,
            config.start,
            config.end,
            config.jobs,
        );
        match series {
            Ok(series) => {
                self.latest = pipeline::fetch_latest(self.source.as_ref(), &config.base, &config.target).ok();
                self.status = format!(
                    "{}/{}: {} of {} days quoted",
                    config.base,
                    config.target,
                    series.present_count(),
                    series.len()
                );
                self.series = Some(series);
                self.recompute();
            }
            Err(err) => {
                self.series = None;
                self.latest = None;
                self.run = None;
                self.status = format!("{err}");
            }
        }
    }

    /// Recompute the moving average and forecast from the cached series.
    fn recompute(&mut self) {
        let Some(series) = &self.series else {
            self.run = None;
            return;
        };
        match pipeline::run_with_series(&self.config(), series.clone(), self.latest) {
            Ok(run) => self.run = Some(run),
            Err(err) => {
                self.run = None;
                self.status = format!("{err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let (start, end) = history_range(self.today, self.history_days);
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("fx", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {}/{} via {}", self.base, self.target, self.source_kind.display_name())),
        ]));

        let latest = match self.latest {
            Some(rate) => crate::report::format_latest(&self.base, &self.target, rate),
            None => "Latest exchange rate: unavailable".to_string(),
        };
        lines.push(Line::from(Span::styled(latest, Style::default().add_modifier(Modifier::BOLD))));

        let quoted = self
            .series
            .as_ref()
            .map(|s| format!("{}/{}", s.present_count(), s.len()))
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(Span::styled(
            format!(
                "history: {start}..{end} | quoted: {quoted} | sma({}) | horizon: {}d",
                self.window, self.horizon_days
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(Field::ALL.len() as u16 + 2), Constraint::Min(0)])
            .split(columns[0]);

        self.draw_settings(frame, left[0]);
        self.draw_forecast(frame, left[1]);
        self.draw_history(frame, columns[1]);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = Field::ALL
            .iter()
            .map(|&field| {
                let text = match field {
                    Field::Source => format!("Source: {}", self.source_kind.display_name()),
                    Field::Base if self.editing_symbol && self.field() == Field::Base => {
                        format!("Base: {}_", self.symbol_input)
                    }
                    Field::Target if self.editing_symbol && self.field() == Field::Target => {
                        format!("Target: {}_", self.symbol_input)
                    }
                    Field::Base => format!("Base: {}", self.base),
                    Field::Target => format!("Target: {}", self.target),
                    Field::HistoryDays => format!("History: {} days", self.history_days),
                    Field::Horizon => format!("Forecast: {} days", self.horizon_days),
                    Field::Window => format!("Window: {} days", self.window),
                };
                ListItem::new(text)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_forecast(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Forecast").borders(Borders::ALL);

        let forecast = match self.run.as_ref().map(|r| r.forecast.as_ref()) {
            Some(Ok(f)) => f,
            Some(Err(err)) => {
                let msg = Paragraph::new(no_forecast_text(err))
                    .style(Style::default().fg(Color::Yellow))
                    .wrap(ratatui::widgets::Wrap { trim: true })
                    .block(block);
                frame.render_widget(msg, area);
                return;
            }
            None => {
                let msg = Paragraph::new("Waiting for data...")
                    .style(Style::default().fg(Color::Yellow))
                    .block(block);
                frame.render_widget(msg, area);
                return;
            }
        };

        let rows: Vec<Row> = forecast
            .rows()
            .map(|(date, value)| Row::new(vec![Cell::from(date.to_string()), Cell::from(format!("{value:.4}"))]))
            .collect();
        let table = Table::new(rows, [Constraint::Length(12), Constraint::Min(8)])
            .header(Row::new(vec!["date", "rate"]).style(Style::default().fg(Color::Cyan)))
            .block(block);
        frame.render_widget(table, area);
    }

    fn draw_history(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Recent history").borders(Borders::ALL);
        let Some(run) = &self.run else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        // Newest first, as many as fit.
        let visible = area.height.saturating_sub(3) as usize;
        let history = crate::report::recent_history(&run.series, &run.smoothed, visible.min(HISTORY_ROWS));
        let rows: Vec<Row> = history
            .iter()
            .rev()
            .map(|r| {
                let rate = r.rate.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string());
                let sma = r.sma.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string());
                let style = if r.rate.is_none() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Row::new(vec![Cell::from(r.date.to_string()), Cell::from(rate), Cell::from(sma)]).style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [Constraint::Length(12), Constraint::Length(14), Constraint::Length(14)],
        )
        .header(
            Row::new(vec!["date".to_string(), "rate".to_string(), format!("sma({})", self.window)])
                .style(Style::default().fg(Color::Cyan)),
        )
        .block(block);
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Enter type symbol  s swap  r refetch  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn no_forecast_text(err: &ForecastError) -> String {
    match err {
        ForecastError::NoForecastAvailable { .. } => {
            format!("{err}. Try a smaller window or a longer history.")
        }
        other => other.to_string(),
    }
}

/// `(start, end)` of a `days`-long history ending on `today`.
fn history_range(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let back = u64::from(days.saturating_sub(1));
    let start = today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
    (start, today)
}

fn default_pair(kind: SourceKind) -> (Symbol, Symbol) {
    match kind {
        SourceKind::Coingecko => (Symbol::from_static("bitcoin"), Symbol::from_static("usd")),
        SourceKind::Frankfurter | SourceKind::Sample => (Symbol::from_static("USD"), Symbol::from_static("EUR")),
    }
}

/// Step to the neighbouring choice; a symbol not in the list jumps to the first.
fn cycle_symbol(current: &Symbol, choices: &[&'static str], delta: i32) -> Symbol {
    let n = choices.len();
    if n == 0 {
        return current.clone();
    }
    let next = match choices.iter().position(|c| c.eq_ignore_ascii_case(current.as_str())) {
        Some(i) if delta >= 0 => (i + 1) % n,
        Some(i) => (i + n - 1) % n,
        None => 0,
    };
    Symbol::from_static(choices[next])
}

fn step_u32(value: u32, delta: i32, step: u32, min: u32, max: u32) -> u32 {
    let next = if delta >= 0 {
        value.saturating_add(step)
    } else {
        value.saturating_sub(step)
    };
    next.clamp(min, max)
}

fn step_usize(value: usize, delta: i32, min: usize, max: usize) -> usize {
    let next = if delta >= 0 {
        value.saturating_add(1)
    } else {
        value.saturating_sub(1)
    };
    next.clamp(min, max.max(min))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Command};
    use crate::data::SampleRateSource;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_app(extra: &[&str]) -> App {
        let mut argv = vec!["fx", "tui", "--source", "sample"];
        argv.extend_from_slice(extra);
        let Command::Tui(args) = Cli::try_parse_from(argv).unwrap().command else {
            panic!("expected tui");
        };
        let today = d(2024, 3, 15);
        let source = SampleRateSource::new(5).with_gap_probability(0.0).with_today(today);
        let mut app = App::new(args, SourceSettings::default(), Box::new(source), today);
        app.refetch();
        app
    }

    fn select(app: &mut App, field: Field) {
        app.selected_field = Field::ALL.iter().position(|f| *f == field).unwrap();
    }

    #[test]
    fn startup_fetch_produces_forecast() {
        let app = sample_app(&["--history-days", "20", "-d", "5"]);
        let run = app.run.as_ref().unwrap();
        assert_eq!(run.series.len(), 20);
        assert_eq!(run.series.end(), d(2024, 3, 15));
        // Friday end, window 5 covers Mon..Fri.
        assert_eq!(run.forecast.as_ref().unwrap().values.len(), 5);
        assert!(app.latest.is_some());
    }

    #[test]
    fn window_change_recomputes_without_refetch() {
        let mut app = sample_app(&["--history-days", "20"]);
        let before = app.series.clone();
        select(&mut app, Field::Window);
        app.handle_key(KeyCode::Left);

        assert_eq!(app.window, 6);
        assert_eq!(app.series, before);
        assert_eq!(app.run.as_ref().unwrap().smoothed.window(), 6);
    }

    #[test]
    fn weekend_heavy_window_reports_no_forecast() {
        // Sunday end with a 1-day window lands on a weekend gap.
        let mut app = sample_app(&["--history-days", "10", "-d", "1"]);
        app.today = d(2024, 3, 17);
        app.refetch();
        let run = app.run.as_ref().unwrap();
        assert!(matches!(run.forecast, Err(ForecastError::NoForecastAvailable { .. })));
        assert!(no_forecast_text(run.forecast.as_ref().unwrap_err()).contains("smaller window"));
    }

    #[test]
    fn typed_symbol_refetches_pair() {
        let mut app = sample_app(&[]);
        select(&mut app, Field::Target);
        app.handle_key(KeyCode::Enter);
        for c in "GBP".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);

        assert_eq!(app.target.as_str(), "GBP");
        assert!(!app.editing_symbol);
        assert!(app.status.starts_with("USD/GBP"));
    }

    #[test]
    fn swap_and_quit_keys() {
        let mut app = sample_app(&[]);
        assert!(!app.handle_key(KeyCode::Char('s')));
        assert_eq!((app.base.as_str(), app.target.as_str()), ("EUR", "USD"));
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn cycling_wraps_and_recovers_from_unknown() {
        let usd = Symbol::new("USD").unwrap();
        assert_eq!(cycle_symbol(&usd, &FOREX_SYMBOLS, 1).as_str(), "EUR");
        assert_eq!(cycle_symbol(&usd, &FOREX_SYMBOLS, -1).as_str(), "PKR");
        let odd = Symbol::new("XAU").unwrap();
        assert_eq!(cycle_symbol(&odd, &FOREX_SYMBOLS, 1).as_str(), "USD");
    }

    #[test]
    fn steps_are_clamped() {
        assert_eq!(step_u32(5, -1, 10, MIN_HISTORY_DAYS, MAX_HISTORY_DAYS), MIN_HISTORY_DAYS);
        assert_eq!(step_u32(725, 1, 10, MIN_HISTORY_DAYS, MAX_HISTORY_DAYS), MAX_HISTORY_DAYS);
        assert_eq!(step_usize(1, -1, 1, 30), 1);
        assert_eq!(step_usize(30, 1, 1, 30), 30);
    }

    #[test]
    fn history_range_is_inclusive() {
        assert_eq!(history_range(d(2024, 3, 15), 15), (d(2024, 3, 1), d(2024, 3, 15)));
    }
}

//! Command-line parsing for the `fx` rate tracker.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the series/forecast code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{SourceKind, Symbol};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fx", version, about = "Forex & crypto rate tracker with a moving-average forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the latest rate for a pair.
    Latest(PairArgs),
    /// Fetch a daily history, smooth it, and print a flat forecast.
    Forecast(ForecastArgs),
    /// Print recent rates for one base against several targets.
    History(HistoryArgs),
    /// Re-render a run saved with `fx forecast --export-json`.
    Show(ShowArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `fx forecast`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Rate source and pair selection.
#[derive(Debug, Args, Clone)]
pub struct PairArgs {
    /// Rate source.
    #[arg(long, value_enum, default_value_t = SourceKind::Frankfurter)]
    pub source: SourceKind,

    /// Base symbol (e.g. USD, bitcoin). Prompted for when omitted.
    #[arg(short = 'b', long)]
    pub base: Option<Symbol>,

    /// Target symbol (e.g. EUR, usd). Prompted for when omitted.
    #[arg(short = 't', long)]
    pub target: Option<Symbol>,
}

/// Options for the forecast command.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub pair: PairArgs,

    /// First day of the history (YYYY-MM-DD).
    #[arg(long, default_value = "2021-01-01")]
    pub start: NaiveDate,

    /// Last day of the history (YYYY-MM-DD).
    #[arg(long, default_value = "2023-01-01")]
    pub end: NaiveDate,

    /// Number of days to forecast.
    #[arg(short = 'd', long, default_value_t = 7, value_parser = clap::value_parser!(u16).range(1..=30))]
    pub days: u16,

    /// Moving-average window in days (defaults to the forecast length).
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub window: Option<u16>,

    /// Parallel lookups (1 = sequential).
    #[arg(short = 'j', long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=32))]
    pub jobs: u16,

    /// Most recent history rows to print.
    #[arg(long, default_value_t = 15)]
    pub rows: usize,

    /// Export the series, moving average and forecast to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the full run to JSON (readable by `fx show`).
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

/// Options for the multi-target history command.
#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    /// Rate source.
    #[arg(long, value_enum, default_value_t = SourceKind::Frankfurter)]
    pub source: SourceKind,

    /// Base symbol. Prompted for when omitted.
    #[arg(short = 'b', long)]
    pub base: Option<Symbol>,

    /// Target symbols, comma separated.
    #[arg(short = 't', long = "targets", value_delimiter = ',', default_value = "EUR,GBP")]
    pub targets: Vec<Symbol>,

    /// Days of history to fetch, counted back from `--end`.
    #[arg(short = 'd', long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=365))]
    pub days: u32,

    /// Last day of the history (defaults to today).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Parallel lookups (1 = sequential).
    #[arg(short = 'j', long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=32))]
    pub jobs: u16,
}

/// Options for re-rendering a saved run.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Run JSON produced by `fx forecast --export-json`.
    #[arg(long, value_name = "JSON")]
    pub file: PathBuf,

    /// Most recent history rows to print.
    #[arg(long, default_value_t = 15)]
    pub rows: usize,
}

/// Options for the TUI.
#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Rate source.
    #[arg(long, value_enum, default_value_t = SourceKind::Frankfurter)]
    pub source: SourceKind,

    /// Base symbol.
    #[arg(short = 'b', long, default_value = "USD")]
    pub base: Symbol,

    /// Target symbol.
    #[arg(short = 't', long, default_value = "EUR")]
    pub target: Symbol,

    /// Days of history shown, counted back from today.
    #[arg(long = "history-days", default_value_t = 60, value_parser = clap::value_parser!(u32).range(2..=730))]
    pub history_days: u32,

    /// Number of days to forecast.
    #[arg(short = 'd', long, default_value_t = 7, value_parser = clap::value_parser!(u16).range(1..=30))]
    pub days: u16,
}

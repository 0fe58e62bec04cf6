//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - opens the rate source
//! - runs the series/forecast pipeline
//! - prints reports
//! - writes optional exports

use chrono::Local;
use clap::Parser;

use crate::cli::picker::resolve_symbol;
use crate::cli::{Command, ForecastArgs, HistoryArgs, PairArgs, ShowArgs, TuiArgs};
use crate::data::{SourceSettings, open_source};
use crate::domain::{ForecastConfig, HistoryConfig};
use crate::error::{AppError, ForecastError};

pub mod pipeline;

/// Entry point for the `fx` binary.
pub fn run() -> Result<(), AppError> {
    // We want `fx` and `fx -b USD` to behave like `fx tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let settings = SourceSettings::from_env()?;

    match cli.command {
        Command::Latest(args) => handle_latest(args, &settings),
        Command::Forecast(args) => handle_forecast(args, &settings),
        Command::History(args) => handle_history(args, &settings),
        Command::Show(args) => handle_show(args),
        Command::Tui(args) => handle_tui(args, settings),
    }
}

fn handle_latest(args: PairArgs, settings: &SourceSettings) -> Result<(), AppError> {
    let base = resolve_symbol(args.base, "--base", "Base symbol", args.source)?;
    let target = resolve_symbol(args.target, "--target", "Target symbol", args.source)?;
    let source = open_source(args.source, settings)?;

    let rate = pipeline::fetch_latest(source.as_ref(), &base, &target)?;
    println!("{}", crate::report::format_latest(&base, &target, rate));
    Ok(())
}

fn handle_forecast(args: ForecastArgs, settings: &SourceSettings) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args)?;
    let source = open_source(config.source, settings)?;
    let run = pipeline::run_forecast(source.as_ref(), &config)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            config.source,
            &config.base,
            &config.target,
            &run.series,
            &run.smoothed,
            run.latest,
        )
    );
    let rows = crate::report::recent_history(&run.series, &run.smoothed, config.history_rows);
    println!("{}", crate::report::format_history(&rows, config.window));
    println!(
        "{}",
        crate::report::format_forecast(run.forecast.as_ref(), &config.base, &config.target)
    );

    // Optional exports.
    if let Some(path) = &config.export_csv {
        crate::io::write_series_csv(path, &run.series, &run.smoothed, run.forecast.as_ref().ok())?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_run_json(path, &run.to_file(&config))?;
    }

    // The history was still useful; the exit code tells scripts there was no forecast.
    run.forecast.map(|_| ()).map_err(AppError::from)
}

fn handle_history(args: HistoryArgs, settings: &SourceSettings) -> Result<(), AppError> {
    let config = history_config_from_args(&args)?;
    let source = open_source(config.source, settings)?;
    let table = pipeline::run_history(source.as_ref(), &config)?;

    println!("{}", crate::report::format_rate_table(&table));
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let run = crate::io::read_run_json(&args.file)?;

    println!(
        "{}",
        crate::report::format_run_summary(run.source, &run.base, &run.target, &run.series, &run.smoothed, None)
    );
    let rows = crate::report::recent_history(&run.series, &run.smoothed, args.rows);
    println!("{}", crate::report::format_history(&rows, run.smoothed.window()));

    let missing = ForecastError::NoForecastAvailable {
        last_date: run.smoothed.last().map(|p| p.date),
    };
    let forecast = run.forecast.as_ref().ok_or(&missing);
    println!("{}", crate::report::format_forecast(forecast, &run.base, &run.target));
    Ok(())
}

fn handle_tui(args: TuiArgs, settings: SourceSettings) -> Result<(), AppError> {
    crate::tui::run(args, settings)
}

pub fn forecast_config_from_args(args: &ForecastArgs) -> Result<ForecastConfig, AppError> {
    if args.start > args.end {
        return Err(ForecastError::InvalidRange {
            start: args.start,
            end: args.end,
        }
        .into());
    }
    let base = resolve_symbol(args.pair.base.clone(), "--base", "Base symbol", args.pair.source)?;
    let target = resolve_symbol(args.pair.target.clone(), "--target", "Target symbol", args.pair.source)?;

    let horizon_days = usize::from(args.days);
    Ok(ForecastConfig {
        source: args.pair.source,
        base,
        target,
        start: args.start,
        end: args.end,
        horizon_days,
        // The dashboards smooth over as many days as they forecast.
        window: args.window.map(usize::from).unwrap_or(horizon_days),
        jobs: usize::from(args.jobs),
        history_rows: args.rows,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    })
}

pub fn history_config_from_args(args: &HistoryArgs) -> Result<HistoryConfig, AppError> {
    let base = resolve_symbol(args.base.clone(), "--base", "Base symbol", args.source)?;
    Ok(HistoryConfig {
        source: args.source,
        base,
        targets: args.targets.clone(),
        end: args.end.unwrap_or_else(|| Local::now().date_naive()),
        days_back: args.days,
        jobs: usize::from(args.jobs),
    })
}

/// Rewrite argv so `fx` defaults to `fx tui`.
///
/// Rules:
/// - `fx`                      -> `fx tui`
/// - `fx -b USD ...`           -> `fx tui -b USD ...`
/// - `fx --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "latest" | "forecast" | "history" | "show" | "tui");
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

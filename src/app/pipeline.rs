//! Shared forecast pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! rate source -> daily series -> moving average -> flat forecast
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::data::RateSource;
use crate::domain::{Forecast, ForecastConfig, ForecastFile, HistoryConfig, RateDate, RateSeries, RateTable, SmoothedSeries, Symbol};
use crate::error::{AppError, ForecastError};
use crate::forecast::{compute_sma, project_forecast};
use crate::series::{build_series_parallel, build_table};

/// All computed outputs of a single forecast run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub series: RateSeries,
    pub smoothed: SmoothedSeries,
    /// `Err(NoForecastAvailable)` is kept here rather than failing the run so
    /// front-ends can still show the history.
    pub forecast: Result<Forecast, ForecastError>,
    /// Latest quote, if the source had one.
    pub latest: Option<f64>,
}

impl RunOutput {
    pub fn to_file(&self, config: &ForecastConfig) -> ForecastFile {
        ForecastFile {
            tool: "fx".to_string(),
            source: config.source,
            base: config.base.clone(),
            target: config.target.clone(),
            window: self.smoothed.window(),
            series: self.series.clone(),
            smoothed: self.smoothed.clone(),
            forecast: self.forecast.as_ref().ok().cloned(),
        }
    }
}

/// Execute the full pipeline against `source`.
pub fn run_forecast(source: &dyn RateSource, config: &ForecastConfig) -> Result<RunOutput, AppError> {
    let series = build_series_parallel(
        source,
        &config.base,
        &config.target,
        config.start,
        config.end,
        config.jobs,
    )?;
    let latest = fetch_latest(source, &config.base, &config.target).ok();

    run_with_series(config, series, latest)
}

/// Execute the smoothing and forecast stages with a pre-fetched series.
///
/// This is useful for the TUI where we want to change the window or horizon
/// without re-fetching.
pub fn run_with_series(config: &ForecastConfig, series: RateSeries, latest: Option<f64>) -> Result<RunOutput, AppError> {
    let smoothed = compute_sma(&series, config.window)?;
    let forecast = match project_forecast(&smoothed, config.horizon_days) {
        Ok(f) => Ok(f),
        Err(err @ ForecastError::NoForecastAvailable { .. }) => {
            log::info!("{}/{}: {err}", config.base, config.target);
            Err(err)
        }
        Err(err) => return Err(err.into()),
    };

    Ok(RunOutput {
        series,
        smoothed,
        forecast,
        latest,
    })
}

/// Latest quote for a pair; lookup failures are reported, not absorbed.
pub fn fetch_latest(source: &dyn RateSource, base: &Symbol, target: &Symbol) -> Result<f64, AppError> {
    source.get_rate(base, target, RateDate::Latest).map_err(|err| {
        log::warn!("{}: latest {base}/{target} unavailable: {err}", source.name());
        AppError::from(err)
    })
}

/// Build the multi-target history table for the configured look-back.
pub fn run_history(source: &dyn RateSource, config: &HistoryConfig) -> Result<RateTable, AppError> {
    let table = build_table(
        source,
        &config.base,
        &config.targets,
        config.start(),
        config.end,
        config.jobs,
    )?;
    Ok(table)
}

//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the series builder, the forecast stage and the front-ends
//! - exported to JSON/CSV
//! - reloaded later with their ordering invariants re-checked

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Currencies offered by the forex dashboards.
pub const FOREX_SYMBOLS: [&str; 10] = [
    "USD", "EUR", "GBP", "INR", "AUD", "CAD", "JPY", "CHF", "CNY", "PKR",
];

/// Crypto asset ids offered by the crypto dashboards (CoinGecko ids).
pub const CRYPTO_SYMBOLS: [&str; 6] = [
    "bitcoin", "ethereum", "solana", "cardano", "ripple", "dogecoin",
];

/// Short identifier of a currency or crypto asset (`"USD"`, `"bitcoin"`).
///
/// Case is preserved; each rate source normalizes to what its API expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ForecastError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ForecastError::invalid("symbol", "must not be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ForecastError::invalid(
                "symbol",
                format!("'{trimmed}' must not contain whitespace"),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Symbol from a built-in list; skips validation.
    pub(crate) fn from_static(s: &'static str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::new(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

/// Point in time a rate is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateDate {
    Latest,
    On(NaiveDate),
}

impl fmt::Display for RateDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateDate::Latest => f.write_str("latest"),
            RateDate::On(d) => write!(f, "{d}"),
        }
    }
}

/// Which rate source backs a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// ECB reference rates (forex).
    Frankfurter,
    /// CoinGecko prices (crypto).
    Coingecko,
    /// Deterministic offline rates.
    Sample,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Frankfurter, SourceKind::Coingecko, SourceKind::Sample];

    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::Frankfurter => "frankfurter",
            SourceKind::Coingecko => "coingecko",
            SourceKind::Sample => "sample",
        }
    }

    /// Symbols offered by pickers for this source.
    pub fn symbol_choices(self) -> &'static [&'static str] {
        match self {
            SourceKind::Frankfurter | SourceKind::Sample => &FOREX_SYMBOLS,
            SourceKind::Coingecko => &CRYPTO_SYMBOLS,
        }
    }

    pub fn next(self) -> Self {
        match self {
            SourceKind::Frankfurter => SourceKind::Coingecko,
            SourceKind::Coingecko => SourceKind::Sample,
            SourceKind::Sample => SourceKind::Frankfurter,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            SourceKind::Frankfurter => SourceKind::Sample,
            SourceKind::Coingecko => SourceKind::Frankfurter,
            SourceKind::Sample => SourceKind::Coingecko,
        }
    }
}

/// A single daily observation. `value` is `None` when the source had no rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Daily rates over an inclusive date range.
///
/// Invariants: never empty, one point per calendar day, dates strictly
/// increasing with no gaps, present values finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RatePoint>", into = "Vec<RatePoint>")]
pub struct RateSeries {
    points: Vec<RatePoint>,
}

impl RateSeries {
    /// Build a series starting at `start` with one value per consecutive day.
    pub fn new(start: NaiveDate, values: Vec<Option<f64>>) -> Result<Self, ForecastError> {
        if values.is_empty() {
            return Err(ForecastError::InvalidSeries("series must contain at least one day".into()));
        }
        let mut points = Vec::with_capacity(values.len());
        for (offset, value) in values.into_iter().enumerate() {
            let date = add_days(start, offset as u64)
                .ok_or_else(|| ForecastError::InvalidSeries(format!("date overflow after {start}")))?;
            points.push(RatePoint { date, value });
        }
        Self::try_from(points)
    }

    pub fn start(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn end(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[RatePoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn present_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    pub fn missing_dates(&self) -> Vec<NaiveDate> {
        self.points
            .iter()
            .filter(|p| p.value.is_none())
            .map(|p| p.date)
            .collect()
    }

    /// Present observations only, in date order.
    pub fn drop_missing(&self) -> Vec<(NaiveDate, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.value.map(|v| (p.date, v)))
            .collect()
    }

    pub fn last_present(&self) -> Option<(NaiveDate, f64)> {
        self.points
            .iter()
            .rev()
            .find_map(|p| p.value.map(|v| (p.date, v)))
    }
}

impl TryFrom<Vec<RatePoint>> for RateSeries {
    type Error = ForecastError;

    fn try_from(points: Vec<RatePoint>) -> Result<Self, Self::Error> {
        if points.is_empty() {
            return Err(ForecastError::InvalidSeries("series must contain at least one day".into()));
        }
        check_contiguous(points.iter().map(|p| p.date)).map_err(ForecastError::InvalidSeries)?;
        if let Some(bad) = points
            .iter()
            .find(|p| p.value.is_some_and(|v| !(v.is_finite() && v > 0.0)))
        {
            return Err(ForecastError::InvalidSeries(format!(
                "rate on {} must be finite and positive",
                bad.date
            )));
        }
        Ok(Self { points })
    }
}

impl From<RateSeries> for Vec<RatePoint> {
    fn from(series: RateSeries) -> Self {
        series.points
    }
}

/// One trailing moving-average value aligned with a series date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPoint {
    pub date: NaiveDate,
    pub sma: Option<f64>,
}

/// Trailing simple moving average aligned 1:1 with a `RateSeries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SmoothedSeriesFile")]
pub struct SmoothedSeries {
    window: usize,
    points: Vec<SmoothedPoint>,
}

#[derive(Deserialize)]
struct SmoothedSeriesFile {
    window: usize,
    points: Vec<SmoothedPoint>,
}

impl TryFrom<SmoothedSeriesFile> for SmoothedSeries {
    type Error = ForecastError;

    fn try_from(file: SmoothedSeriesFile) -> Result<Self, Self::Error> {
        if file.window == 0 {
            return Err(ForecastError::InvalidSeries("window must be >= 1".into()));
        }
        check_contiguous(file.points.iter().map(|p| p.date)).map_err(ForecastError::InvalidSeries)?;
        Ok(Self {
            window: file.window,
            points: file.points,
        })
    }
}

impl SmoothedSeries {
    pub(crate) fn from_parts(window: usize, points: Vec<SmoothedPoint>) -> Self {
        Self { window, points }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn points(&self) -> &[SmoothedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.sma).collect()
    }

    pub fn last(&self) -> Option<&SmoothedPoint> {
        self.points.last()
    }
}

/// Flat projection of the final moving-average value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub horizon_days: usize,
    /// Date of the moving-average value being projected.
    pub basis_date: NaiveDate,
    /// The projected value (final SMA of the input).
    pub basis: f64,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl Forecast {
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// One target column of a multi-target history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateColumn {
    pub symbol: Symbol,
    pub values: Vec<Option<f64>>,
}

/// A row where every target had a rate.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteRow {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

/// Rates for several targets against one base over a shared date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: Symbol,
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<RateColumn>,
}

impl RateTable {
    /// Assemble a table from per-target series covering the same range.
    pub fn from_series(base: Symbol, series: Vec<(Symbol, RateSeries)>) -> Result<Self, ForecastError> {
        let Some((_, first)) = series.first() else {
            return Err(ForecastError::invalid("targets", "at least one target is required"));
        };
        let dates: Vec<NaiveDate> = first.points().iter().map(|p| p.date).collect();

        let mut columns = Vec::with_capacity(series.len());
        for (symbol, s) in series {
            if s.start() != dates[0] || s.len() != dates.len() {
                return Err(ForecastError::InvalidSeries(format!(
                    "series for {symbol} covers {}..{}, expected {}..{}",
                    s.start(),
                    s.end(),
                    dates[0],
                    dates[dates.len() - 1]
                )));
            }
            columns.push(RateColumn {
                symbol,
                values: s.values(),
            });
        }

        Ok(Self { base, dates, columns })
    }

    /// Rows where every column is present, in date order.
    pub fn drop_incomplete(&self) -> Vec<CompleteRow> {
        self.dates
            .iter()
            .enumerate()
            .filter_map(|(i, date)| {
                let values = self
                    .columns
                    .iter()
                    .map(|c| c.values[i])
                    .collect::<Option<Vec<f64>>>()?;
                Some(CompleteRow { date: *date, values })
            })
            .collect()
    }

    pub fn latest_complete(&self) -> Option<CompleteRow> {
        self.drop_incomplete().pop()
    }
}

/// A forecast run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub source: SourceKind,
    pub base: Symbol,
    pub target: Symbol,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub horizon_days: usize,
    pub window: usize,
    /// Worker threads for fetching; 1 fetches sequentially.
    pub jobs: usize,
    /// Rows of history shown in reports (most recent first cut).
    pub history_rows: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Multi-target history configuration.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub source: SourceKind,
    pub base: Symbol,
    pub targets: Vec<Symbol>,
    pub end: NaiveDate,
    pub days_back: u32,
    pub jobs: usize,
}

impl HistoryConfig {
    pub fn start(&self) -> NaiveDate {
        self.end
            .checked_sub_days(Days::new(u64::from(self.days_back)))
            .unwrap_or(self.end)
    }
}

/// A saved forecast run (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastFile {
    pub tool: String,
    pub source: SourceKind,
    pub base: Symbol,
    pub target: Symbol,
    pub window: usize,
    pub series: RateSeries,
    pub smoothed: SmoothedSeries,
    pub forecast: Option<Forecast>,
}

/// Number of calendar days in `[start, end]`; zero when `start > end`.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> usize {
    if start > end {
        return 0;
    }
    (end - start).num_days() as usize + 1
}

/// Every calendar day in `[start, end]`, ascending.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

pub(crate) fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

fn check_contiguous(dates: impl Iterator<Item = NaiveDate>) -> Result<(), String> {
    let mut prev: Option<NaiveDate> = None;
    for date in dates {
        if let Some(p) = prev {
            if add_days(p, 1) != Some(date) {
                return Err(format!("dates must be consecutive days: {p} is followed by {date}"));
            }
        }
        prev = Some(date);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn symbol_rejects_blank_and_whitespace() {
        assert!(Symbol::new("  ").is_err());
        assert!(Symbol::new("US D").is_err());
        assert_eq!(Symbol::new(" USD ").unwrap().as_str(), "USD");
    }

    #[test]
    fn series_new_assigns_consecutive_dates() {
        let s = RateSeries::new(d(2024, 2, 28), vec![Some(1.0), None, Some(1.2)]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.start(), d(2024, 2, 28));
        assert_eq!(s.end(), d(2024, 3, 1));
        assert_eq!(s.missing_dates(), vec![d(2024, 2, 29)]);
        assert_eq!(s.drop_missing(), vec![(d(2024, 2, 28), 1.0), (d(2024, 3, 1), 1.2)]);
        assert_eq!(s.last_present(), Some((d(2024, 3, 1), 1.2)));
    }

    #[test]
    fn series_rejects_gaps_and_bad_values() {
        let gap = vec![
            RatePoint { date: d(2024, 1, 1), value: Some(1.0) },
            RatePoint { date: d(2024, 1, 3), value: Some(1.0) },
        ];
        assert!(RateSeries::try_from(gap).is_err());

        assert!(RateSeries::new(d(2024, 1, 1), vec![Some(-1.0)]).is_err());
        assert!(RateSeries::new(d(2024, 1, 1), vec![Some(f64::NAN)]).is_err());
        assert!(RateSeries::new(d(2024, 1, 1), vec![]).is_err());
    }

    #[test]
    fn series_json_reload_rechecks_order() {
        let s = RateSeries::new(d(2024, 1, 1), vec![Some(1.0), Some(2.0)]).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: RateSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);

        let reversed = r#"[{"date":"2024-01-02","value":1.0},{"date":"2024-01-01","value":1.0}]"#;
        assert!(serde_json::from_str::<RateSeries>(reversed).is_err());
    }

    #[test]
    fn table_drops_incomplete_rows() {
        let base = Symbol::new("USD").unwrap();
        let eur = RateSeries::new(d(2024, 1, 1), vec![Some(0.9), None, Some(0.91)]).unwrap();
        let gbp = RateSeries::new(d(2024, 1, 1), vec![Some(0.8), Some(0.81), None]).unwrap();
        let table = RateTable::from_series(
            base,
            vec![(Symbol::new("EUR").unwrap(), eur), (Symbol::new("GBP").unwrap(), gbp)],
        )
        .unwrap();

        let rows = table.drop_incomplete();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, d(2024, 1, 1));
        assert_eq!(rows[0].values, vec![0.9, 0.8]);
        assert_eq!(table.latest_complete().map(|r| r.date), Some(d(2024, 1, 1)));
    }

    #[test]
    fn table_rejects_mismatched_ranges() {
        let base = Symbol::new("USD").unwrap();
        let a = RateSeries::new(d(2024, 1, 1), vec![Some(1.0)]).unwrap();
        let b = RateSeries::new(d(2024, 1, 2), vec![Some(1.0)]).unwrap();
        let err = RateTable::from_series(
            base,
            vec![(Symbol::new("EUR").unwrap(), a), (Symbol::new("GBP").unwrap(), b)],
        );
        assert!(matches!(err, Err(ForecastError::InvalidSeries(_))));
    }

    #[test]
    fn range_helpers_count_inclusive_days() {
        assert_eq!(days_in_range(d(2021, 1, 1), d(2021, 1, 1)), 1);
        assert_eq!(days_in_range(d(2021, 1, 1), d(2023, 1, 1)), 731);
        assert_eq!(days_in_range(d(2021, 1, 2), d(2021, 1, 1)), 0);
        assert_eq!(date_range(d(2021, 12, 30), d(2022, 1, 2)).len(), 4);
    }

    #[test]
    fn history_start_counts_back_from_end() {
        let cfg = HistoryConfig {
            source: SourceKind::Sample,
            base: Symbol::new("USD").unwrap(),
            targets: vec![Symbol::new("EUR").unwrap()],
            end: d(2024, 3, 31),
            days_back: 30,
            jobs: 1,
        };
        assert_eq!(cfg.start(), d(2024, 3, 1));
    }
}

//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the series/forecast code stays clean and testable
//! - output changes are localized

use crate::domain::{Forecast, RateSeries, RateTable, SmoothedSeries, SourceKind, Symbol};
use crate::error::ForecastError;
use crate::report::{HistoryRow, column_max_rows};

/// One-line latest quote, e.g. `1 USD = 0.92 EUR`.
pub fn format_latest(base: &Symbol, target: &Symbol, rate: f64) -> String {
    format!("Latest exchange rate: 1 {base} = {rate:.2} {target}")
}

/// Header block for a forecast run.
pub fn format_run_summary(
    source: SourceKind,
    base: &Symbol,
    target: &Symbol,
    series: &RateSeries,
    smoothed: &SmoothedSeries,
    latest: Option<f64>,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== fx - {base}/{target} ({}) ===\n", source.display_name()));
    out.push_str(&format!(
        "History: {}..{} | {} days | {} quoted | {} missing\n",
        series.start(),
        series.end(),
        series.len(),
        series.present_count(),
        series.len() - series.present_count(),
    ));
    out.push_str(&format!(
        "SMA window: {} days | defined on {} days\n",
        smoothed.window(),
        smoothed.points().iter().filter(|p| p.sma.is_some()).count(),
    ));
    match latest {
        Some(rate) => out.push_str(&format!("{}\n", format_latest(base, target, rate))),
        None => out.push_str("Latest exchange rate: unavailable\n"),
    }

    out
}

/// Date / rate / SMA table.
pub fn format_history(rows: &[HistoryRow], window: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<12} {:>14} {:>14}\n", "date", "rate", format!("sma({window})")));
    out.push_str(&format!("{:-<12} {:-<14} {:-<14}\n", "", "", ""));
    for r in rows {
        out.push_str(&format!(
            "{:<12} {:>14} {:>14}\n",
            r.date.to_string(),
            fmt_opt(r.rate),
            fmt_opt(r.sma)
        ));
    }
    out
}

/// Forecast table, or the reason there is none.
pub fn format_forecast(forecast: Result<&Forecast, &ForecastError>, base: &Symbol, target: &Symbol) -> String {
    let forecast = match forecast {
        Ok(f) => f,
        Err(err) => return format!("No forecast for {base}/{target}: {err}\n"),
    };

    let mut out = String::new();
    out.push_str(&format!(
        "{}-day forecast for {base} to {target} (flat from SMA on {}):\n",
        forecast.horizon_days, forecast.basis_date
    ));
    out.push_str(&format!("{:<12} {:>14}\n", "date", "forecast"));
    out.push_str(&format!("{:-<12} {:-<14}\n", "", ""));
    for (date, value) in forecast.rows() {
        out.push_str(&format!("{:<12} {:>14.4}\n", date.to_string(), value));
    }
    out
}

/// Multi-target table with incomplete rows dropped; each column's maximum is
/// starred.
pub fn format_rate_table(table: &RateTable) -> String {
    let rows = table.drop_incomplete();
    let mut out = String::new();

    out.push_str(&format!("Current rates (1 {}):\n", table.base));
    match rows.last() {
        Some(last) => {
            for (col, value) in table.columns.iter().zip(&last.values) {
                out.push_str(&format!("  {:<10} {value:.4}\n", col.symbol.as_str()));
            }
            out.push_str(&format!("  as of {}\n", last.date));
        }
        None => out.push_str("  (no day with a quote for every target)\n"),
    }

    out.push_str(&format!(
        "\nHistory ({} of {} days complete):\n",
        rows.len(),
        table.dates.len()
    ));
    let mut header = format!("{:<12}", "date");
    let mut rule = format!("{:-<12}", "");
    for col in &table.columns {
        header.push_str(&format!(" {:>14}", col.symbol.as_str()));
        rule.push_str(&format!(" {:-<14}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    let maxima = column_max_rows(&rows);
    for (i, row) in rows.iter().enumerate() {
        let mut line = format!("{:<12}", row.date.to_string());
        for (col, value) in row.values.iter().enumerate() {
            let mark = if maxima.get(col).copied().flatten() == Some(i) { "*" } else { " " };
            line.push_str(&format!(" {:>13.4}{mark}", value));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.4}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::forecast::{compute_sma, project_forecast};

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn latest_uses_two_decimals() {
        assert_eq!(
            format_latest(&sym("USD"), &sym("EUR"), 0.91876),
            "Latest exchange rate: 1 USD = 0.92 EUR"
        );
    }

    #[test]
    fn history_marks_missing_values() {
        let rows = vec![HistoryRow { date: d(2021, 1, 1), rate: None, sma: Some(1.5) }];
        let text = format_history(&rows, 7);
        assert!(text.contains("sma(7)"));
        let line = text.lines().nth(2).unwrap();
        assert!(line.starts_with("2021-01-01"));
        assert!(line.contains(" - "));
        assert!(line.ends_with("1.5000"));
    }

    #[test]
    fn forecast_table_lists_each_day() {
        let s = RateSeries::new(d(2021, 1, 1), vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)]).unwrap();
        let f = project_forecast(&compute_sma(&s, 2).unwrap(), 3).unwrap();
        let text = format_forecast(Ok(&f), &sym("USD"), &sym("EUR"));
        assert!(text.starts_with("3-day forecast for USD to EUR"));
        assert_eq!(text.matches("35.0000").count(), 3);
        assert!(text.contains("2021-01-07"));
    }

    #[test]
    fn missing_forecast_explains_why() {
        let err = ForecastError::NoForecastAvailable { last_date: Some(d(2021, 1, 4)) };
        let text = format_forecast(Err(&err), &sym("USD"), &sym("EUR"));
        assert!(text.starts_with("No forecast for USD/EUR"));
        assert!(text.contains("2021-01-04"));
    }

    #[test]
    fn rate_table_stars_column_max() {
        let eur = RateSeries::new(d(2024, 1, 1), vec![Some(0.90), Some(0.95), None]).unwrap();
        let gbp = RateSeries::new(d(2024, 1, 1), vec![Some(0.80), Some(0.70), Some(0.75)]).unwrap();
        let table = RateTable::from_series(sym("USD"), vec![(sym("EUR"), eur), (sym("GBP"), gbp)]).unwrap();
        let text = format_rate_table(&table);

        assert!(text.contains("as of 2024-01-02"));
        assert!(text.contains("History (2 of 3 days complete)"));
        assert!(text.contains("0.9500*"));
        assert!(text.contains("0.8000*"));
        assert!(!text.contains("2024-01-03"));
    }
}

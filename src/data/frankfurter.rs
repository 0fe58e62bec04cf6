//! Frankfurter API integration for ECB forex reference rates.

use std::collections::HashMap;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::{RateSource, SourceSettings, http_client, status_failure};
use crate::domain::{RateDate, Symbol};
use crate::error::{AppError, RateUnavailable};

pub struct FrankfurterClient {
    client: Client,
    base_url: String,
    strict_dates: bool,
}

impl FrankfurterClient {
    pub fn new(settings: &SourceSettings) -> Result<Self, AppError> {
        Ok(Self {
            client: http_client(settings.timeout)?,
            base_url: settings.frankfurter_url.clone(),
            strict_dates: settings.strict_dates,
        })
    }

    fn fetch(&self, from: &str, to: &str, at: RateDate) -> Result<RatesResponse, RateUnavailable> {
        let path = match at {
            RateDate::Latest => "latest".to_string(),
            RateDate::On(date) => date.format("%Y-%m-%d").to_string(),
        };
        let url = format!("{}/{path}", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("from", from), ("to", to)])
            .send()
            .map_err(|e| RateUnavailable::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(status_failure(resp.status().as_u16()));
        }

        resp.json::<RatesResponse>()
            .map_err(|e| RateUnavailable::InvalidResponse(format!("Failed to parse Frankfurter response: {e}")))
    }
}

impl RateSource for FrankfurterClient {
    fn name(&self) -> &str {
        "frankfurter"
    }

    fn get_rate(&self, base: &Symbol, target: &Symbol, at: RateDate) -> Result<f64, RateUnavailable> {
        let from = base.as_str().to_ascii_uppercase();
        let to = target.as_str().to_ascii_uppercase();
        if from == to {
            return Ok(1.0);
        }

        let body = self.fetch(&from, &to, at)?;
        extract_rate(&body, &to, at, self.strict_dates)
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    date: String,
    rates: HashMap<String, f64>,
}

/// Pull the target rate out of a response body.
///
/// The API answers weekend and holiday requests with the previous business
/// day's fixing; with `strict_dates` that fallback counts as no quote.
fn extract_rate(body: &RatesResponse, to: &str, at: RateDate, strict_dates: bool) -> Result<f64, RateUnavailable> {
    let rate = *body
        .rates
        .get(to)
        .ok_or_else(|| RateUnavailable::UnknownSymbol(to.to_string()))?;

    if let RateDate::On(requested) = at {
        let quoted = NaiveDate::parse_from_str(&body.date, "%Y-%m-%d").map_err(|e| {
            RateUnavailable::InvalidResponse(format!("Invalid Frankfurter date '{}': {e}", body.date))
        })?;
        if strict_dates && quoted != requested {
            return Err(RateUnavailable::NoQuote { date: requested });
        }
    }

    if !(rate.is_finite() && rate > 0.0) {
        return Err(RateUnavailable::InvalidResponse(format!("Non-positive rate {rate} for {to}")));
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> RatesResponse {
        serde_json::from_str(json).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn extracts_rate_for_requested_day() {
        let b = body(r#"{"amount":1.0,"base":"USD","date":"2021-01-04","rates":{"EUR":0.81493}}"#);
        let rate = extract_rate(&b, "EUR", RateDate::On(d(2021, 1, 4)), true).unwrap();
        assert!((rate - 0.81493).abs() < 1e-12);
    }

    #[test]
    fn weekend_fallback_depends_on_strictness() {
        // Saturday request answered with Friday's fixing.
        let b = body(r#"{"amount":1.0,"base":"USD","date":"2021-01-08","rates":{"EUR":0.8149}}"#);
        let saturday = RateDate::On(d(2021, 1, 9));
        assert!(extract_rate(&b, "EUR", saturday, false).is_ok());
        assert_eq!(
            extract_rate(&b, "EUR", saturday, true),
            Err(RateUnavailable::NoQuote { date: d(2021, 1, 9) })
        );
    }

    #[test]
    fn missing_target_is_unknown_symbol() {
        let b = body(r#"{"amount":1.0,"base":"USD","date":"2021-01-04","rates":{"GBP":0.73}}"#);
        assert_eq!(
            extract_rate(&b, "EUR", RateDate::Latest, false),
            Err(RateUnavailable::UnknownSymbol("EUR".to_string()))
        );
    }

    #[test]
    fn identity_pair_skips_the_network() {
        let settings = SourceSettings {
            frankfurter_url: "http://127.0.0.1:9".to_string(),
            ..SourceSettings::default()
        };
        let client = FrankfurterClient::new(&settings).unwrap();
        let usd = Symbol::new("usd").unwrap();
        let usd_upper = Symbol::new("USD").unwrap();
        assert_eq!(client.get_rate(&usd, &usd_upper, RateDate::Latest), Ok(1.0));
    }
}

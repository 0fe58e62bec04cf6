//! CoinGecko integration for crypto prices.
//!
//! Base symbols are CoinGecko coin ids (`bitcoin`), targets are quote
//! currencies (`usd`). Both are lower-cased before the request.

use std::collections::HashMap;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::{RateSource, SourceSettings, http_client, status_failure};
use crate::domain::{RateDate, Symbol};
use crate::error::{AppError, RateUnavailable};

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(settings: &SourceSettings) -> Result<Self, AppError> {
        Ok(Self {
            client: http_client(settings.timeout)?,
            base_url: settings.coingecko_url.clone(),
            api_key: settings.coingecko_api_key.clone(),
        })
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, RateUnavailable> {
        let mut req = self.client.get(url).query(query);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }

        let resp = req.send().map_err(|e| RateUnavailable::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(status_failure(resp.status().as_u16()));
        }

        resp.json::<T>()
            .map_err(|e| RateUnavailable::InvalidResponse(format!("Failed to parse CoinGecko response: {e}")))
    }
}

impl RateSource for CoinGeckoClient {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn get_rate(&self, base: &Symbol, target: &Symbol, at: RateDate) -> Result<f64, RateUnavailable> {
        let coin = base.as_str().to_ascii_lowercase();
        let vs = target.as_str().to_ascii_lowercase();
        if coin == vs {
            return Ok(1.0);
        }

        match at {
            RateDate::Latest => {
                let url = format!("{}/simple/price", self.base_url);
                let body: SimplePriceResponse =
                    self.get_json(&url, &[("ids", coin.as_str()), ("vs_currencies", vs.as_str())])?;
                extract_simple_price(&body, &coin, &vs)
            }
            RateDate::On(date) => {
                let url = format!("{}/coins/{coin}/history", self.base_url);
                let day = date.format("%d-%m-%Y").to_string();
                let body: HistoryResponse =
                    self.get_json(&url, &[("date", day.as_str()), ("localization", "false")])?;
                extract_history_price(&body, &vs, date)
            }
        }
    }
}

type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    market_data: Option<MarketData>,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    current_price: HashMap<String, f64>,
}

fn extract_simple_price(body: &SimplePriceResponse, coin: &str, vs: &str) -> Result<f64, RateUnavailable> {
    let prices = body
        .get(coin)
        .ok_or_else(|| RateUnavailable::UnknownSymbol(coin.to_string()))?;
    let price = *prices
        .get(vs)
        .ok_or_else(|| RateUnavailable::UnknownSymbol(vs.to_string()))?;
    positive(price, vs)
}

fn extract_history_price(body: &HistoryResponse, vs: &str, date: NaiveDate) -> Result<f64, RateUnavailable> {
    // Days before a coin was listed come back without `market_data`.
    let market = body
        .market_data
        .as_ref()
        .ok_or(RateUnavailable::NoQuote { date })?;
    let price = *market
        .current_price
        .get(vs)
        .ok_or_else(|| RateUnavailable::UnknownSymbol(vs.to_string()))?;
    positive(price, vs)
}

fn positive(price: f64, vs: &str) -> Result<f64, RateUnavailable> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(RateUnavailable::InvalidResponse(format!("Non-positive price {price} in {vs}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_simple_price() {
        let body: SimplePriceResponse = serde_json::from_str(r#"{"bitcoin":{"usd":67123.5}}"#).unwrap();
        assert_eq!(extract_simple_price(&body, "bitcoin", "usd"), Ok(67123.5));
        assert_eq!(
            extract_simple_price(&body, "ethereum", "usd"),
            Err(RateUnavailable::UnknownSymbol("ethereum".to_string()))
        );
    }

    #[test]
    fn parses_history_price() {
        let body: HistoryResponse = serde_json::from_str(
            r#"{"id":"bitcoin","symbol":"btc","market_data":{"current_price":{"usd":29374.15,"eur":24000.0}}}"#,
        )
        .unwrap();
        let price = extract_history_price(&body, "usd", d(2021, 1, 1)).unwrap();
        assert!((price - 29374.15).abs() < 1e-9);
    }

    #[test]
    fn history_without_market_data_is_no_quote() {
        let body: HistoryResponse = serde_json::from_str(r#"{"id":"bitcoin","symbol":"btc"}"#).unwrap();
        assert_eq!(
            extract_history_price(&body, "usd", d(2009, 1, 1)),
            Err(RateUnavailable::NoQuote { date: d(2009, 1, 1) })
        );
    }

    #[test]
    fn zero_price_is_rejected() {
        let body: SimplePriceResponse = serde_json::from_str(r#"{"bitcoin":{"usd":0.0}}"#).unwrap();
        assert!(matches!(
            extract_simple_price(&body, "bitcoin", "usd"),
            Err(RateUnavailable::InvalidResponse(_))
        ));
    }
}

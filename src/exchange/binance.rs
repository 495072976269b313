//! Binance Spot adapter (public REST endpoints only).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::AppConfig;
use crate::error::ExchangeError;

use super::{
    symbols::to_binance_symbol,
    traits::{ExchangeResult, MarketDataApi},
    types::{value_f64, MarketInfo, RawCandle, Ticker},
};

const INTERVALS: &[&str] = &["1m", "5m", "15m", "30m", "1h", "4h", "1d", "1w"];

#[derive(Clone)]
pub struct BinanceExchange {
    client: Client,
    base_url: String,
}

impl BinanceExchange {
    pub fn new(config: &AppConfig) -> Self {
        let base_url = config
            .binance
            .as_ref()
            .map(|e| e.base_url.clone())
            .unwrap_or_else(|| "https://api.binance.com".to_string());
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .expect("failed to build HTTP client");
        Self { client, base_url }
    }

    async fn get_json(&self, url: &str) -> ExchangeResult<Value> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ExchangeError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl MarketDataApi for BinanceExchange {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn load_markets(&self) -> ExchangeResult<HashMap<String, MarketInfo>> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        let raw = self.get_json(&url).await?;

        let listed = raw
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ExchangeError::Parse("exchangeInfo missing symbols".to_string()))?;

        let mut markets = HashMap::new();
        for entry in listed {
            if entry.get("status").and_then(|v| v.as_str()) != Some("TRADING") {
                continue;
            }
            let (Some(base), Some(quote)) = (
                entry.get("baseAsset").and_then(|v| v.as_str()),
                entry.get("quoteAsset").and_then(|v| v.as_str()),
            ) else {
                continue;
            };

            let symbol = format!("{}/{}", base, quote);
            markets.insert(
                symbol.clone(),
                MarketInfo {
                    symbol,
                    base: base.to_string(),
                    quote: quote.to_string(),
                },
            );
        }
        Ok(markets)
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        let id = to_binance_symbol(symbol);
        let url = format!("{}/api/v3/ticker/24hr?symbol={}", self.base_url, id);
        let raw = self.get_json(&url).await?;

        let field = |key: &str| -> ExchangeResult<f64> {
            raw.get(key)
                .and_then(value_f64)
                .ok_or_else(|| ExchangeError::Parse(format!("ticker field {} missing", key)))
        };

        Ok(Ticker {
            symbol: symbol.to_string(),
            last: field("lastPrice")?,
            high_24h: field("highPrice")?,
            low_24h: field("lowPrice")?,
            volume: None,
            base_volume: raw.get("volume").and_then(value_f64),
            quote_volume: raw.get("quoteVolume").and_then(value_f64),
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<RawCandle>> {
        if !INTERVALS.contains(&timeframe) {
            return Err(ExchangeError::UnsupportedTimeframe(timeframe.to_string()));
        }
        let id = to_binance_symbol(symbol);
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, id, timeframe, limit
        );
        let raw = self.get_json(&url).await?;

        let rows = raw
            .as_array()
            .ok_or_else(|| ExchangeError::Parse("klines response is not an array".to_string()))?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            // [open_time_ms, open, high, low, close, volume, close_time, ...]
            let ts = row
                .get(0)
                .and_then(|v| v.as_i64())
                .ok_or_else(|| ExchangeError::Parse("kline row missing open time".to_string()))?;
            let num = |idx: usize| -> ExchangeResult<f64> {
                row.get(idx)
                    .and_then(value_f64)
                    .ok_or_else(|| ExchangeError::Parse(format!("kline row field {} missing", idx)))
            };
            candles.push(RawCandle {
                open_time_ms: ts,
                open: num(1)?,
                high: num(2)?,
                low: num(3)?,
                close: num(4)?,
                volume: num(5)?,
            });
        }
        Ok(candles)
    }
}

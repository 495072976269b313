//! Kraken Spot adapter (public REST endpoints only).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::AppConfig;
use crate::error::ExchangeError;

use super::{
    symbols::to_kraken_pair,
    traits::{ExchangeResult, MarketDataApi},
    types::{keep_newest, value_f64, MarketInfo, RawCandle, Ticker},
};

#[derive(Clone)]
pub struct KrakenExchange {
    client: Client,
    base_url: String,
}

impl KrakenExchange {
    pub fn new(config: &AppConfig) -> Self {
        let base_url = config
            .kraken
            .as_ref()
            .map(|e| e.base_url.clone())
            .unwrap_or_else(|| "https://api.kraken.com".to_string());
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .expect("failed to build HTTP client");
        Self { client, base_url }
    }

    /// Kraken wraps every payload as {"error": [...], "result": {...}}.
    async fn get_result(&self, url: &str) -> ExchangeResult<Value> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ExchangeError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        let raw: Value = serde_json::from_str(&text)?;

        if let Some(errors) = raw.get("error").and_then(|v| v.as_array()) {
            if !errors.is_empty() {
                let msg = errors
                    .iter()
                    .filter_map(|e| e.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ExchangeError::Api(msg));
            }
        }

        raw.get("result")
            .cloned()
            .ok_or_else(|| ExchangeError::Parse("missing result field".to_string()))
    }

    fn interval_minutes(timeframe: &str) -> ExchangeResult<u32> {
        let minutes = match timeframe {
            "1m" => 1,
            "5m" => 5,
            "15m" => 15,
            "30m" => 30,
            "1h" => 60,
            "4h" => 240,
            "1d" => 1440,
            "1w" => 10_080,
            other => return Err(ExchangeError::UnsupportedTimeframe(other.to_string())),
        };
        Ok(minutes)
    }
}

#[async_trait]
impl MarketDataApi for KrakenExchange {
    fn name(&self) -> &'static str {
        "kraken"
    }

    async fn load_markets(&self) -> ExchangeResult<HashMap<String, MarketInfo>> {
        let url = format!("{}/0/public/AssetPairs", self.base_url);
        let result = self.get_result(&url).await?;

        let pairs = result
            .as_object()
            .ok_or_else(|| ExchangeError::Parse("AssetPairs result is not an object".to_string()))?;

        let mut markets = HashMap::new();
        for info in pairs.values() {
            // wsname carries the slash form ("XBT/USD"); pairs without one
            // (e.g. dark pools) are not addressable here and are skipped.
            let Some(wsname) = info.get("wsname").and_then(|v| v.as_str()) else {
                continue;
            };
            let Some((base, quote)) = wsname.split_once('/') else {
                continue;
            };

            markets.insert(
                wsname.to_string(),
                MarketInfo {
                    symbol: wsname.to_string(),
                    base: base.to_string(),
                    quote: quote.to_string(),
                },
            );
        }
        Ok(markets)
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        let pair = to_kraken_pair(symbol);
        let url = format!("{}/0/public/Ticker?pair={}", self.base_url, pair);
        let result = self.get_result(&url).await?;

        // Result is keyed by Kraken's internal pair name; one pair requested,
        // one entry returned.
        let info = result
            .as_object()
            .and_then(|o| o.values().next())
            .ok_or_else(|| ExchangeError::Parse(format!("no ticker entry for {}", pair)))?;

        let field = |key: &str, idx: usize| -> ExchangeResult<f64> {
            info.get(key)
                .and_then(|v| v.get(idx))
                .and_then(value_f64)
                .ok_or_else(|| ExchangeError::Parse(format!("ticker field {}[{}] missing", key, idx)))
        };

        let last = field("c", 0)?;
        let high_24h = field("h", 1)?;
        let low_24h = field("l", 1)?;
        let base_volume = field("v", 1)?;
        // Kraken has no direct quote volume; derive it from the 24h vwap.
        let quote_volume = field("p", 1).ok().map(|vwap| vwap * base_volume);

        Ok(Ticker {
            symbol: symbol.to_string(),
            last,
            high_24h,
            low_24h,
            volume: None,
            base_volume: Some(base_volume),
            quote_volume,
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<RawCandle>> {
        let interval = Self::interval_minutes(timeframe)?;
        let pair = to_kraken_pair(symbol);
        let url = format!(
            "{}/0/public/OHLC?pair={}&interval={}",
            self.base_url, pair, interval
        );
        let result = self.get_result(&url).await?;

        // Result holds the candle array under the pair key plus a "last"
        // cursor; pick the array entry.
        let rows = result
            .as_object()
            .and_then(|o| o.values().find_map(|v| v.as_array()))
            .ok_or_else(|| ExchangeError::Parse(format!("no OHLC rows for {}", pair)))?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            // [time_s, open, high, low, close, vwap, volume, count]
            let ts = row
                .get(0)
                .and_then(|v| v.as_i64())
                .ok_or_else(|| ExchangeError::Parse("OHLC row missing timestamp".to_string()))?;
            let num = |idx: usize| -> ExchangeResult<f64> {
                row.get(idx)
                    .and_then(value_f64)
                    .ok_or_else(|| ExchangeError::Parse(format!("OHLC row field {} missing", idx)))
            };
            candles.push(RawCandle {
                open_time_ms: ts * 1000,
                open: num(1)?,
                high: num(2)?,
                low: num(3)?,
                close: num(4)?,
                volume: num(6)?,
            });
        }

        // Kraken ignores any count parameter; keep the newest `limit` rows.
        Ok(keep_newest(candles, limit))
    }
}

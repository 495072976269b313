//! Coinbase Exchange adapter (public REST endpoints only).

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::AppConfig;
use crate::error::ExchangeError;

use super::{
    symbols::to_coinbase_product_id,
    traits::{ExchangeResult, MarketDataApi},
    types::{oldest_first_window, value_f64, MarketInfo, RawCandle, Ticker},
};

// Coinbase rejects requests without a User-Agent.
const UA: &str = concat!("rust_cryptofetch/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct CoinbaseExchange {
    client: Client,
    base_url: String,
}

impl CoinbaseExchange {
    pub fn new(config: &AppConfig) -> Self {
        let base_url = config
            .coinbase
            .as_ref()
            .map(|e| e.base_url.clone())
            .unwrap_or_else(|| "https://api.exchange.coinbase.com".to_string());
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .expect("failed to build HTTP client");
        Self { client, base_url }
    }

    fn granularity_secs(timeframe: &str) -> ExchangeResult<u32> {
        let secs = match timeframe {
            "1m" => 60,
            "5m" => 300,
            "15m" => 900,
            "1h" => 3600,
            "6h" => 21_600,
            "1d" => 86_400,
            other => return Err(ExchangeError::UnsupportedTimeframe(other.to_string())),
        };
        Ok(secs)
    }

    async fn get_json(&self, url: &str) -> ExchangeResult<Value> {
        let resp = self.client.get(url).header(USER_AGENT, UA).send().await?;
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
impl MarketDataApi for CoinbaseExchange {
    fn name(&self) -> &'static str {
        "coinbase"
    }

    async fn load_markets(&self) -> ExchangeResult<HashMap<String, MarketInfo>> {
        let url = format!("{}/products", self.base_url);
        let raw = self.get_json(&url).await?;

        let products = raw
            .as_array()
            .ok_or_else(|| ExchangeError::Parse("products response is not an array".to_string()))?;

        let mut markets = HashMap::new();
        for product in products {
            if product.get("status").and_then(|v| v.as_str()) != Some("online") {
                continue;
            }
            let (Some(base), Some(quote)) = (
                product.get("base_currency").and_then(|v| v.as_str()),
                product.get("quote_currency").and_then(|v| v.as_str()),
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
        let id = to_coinbase_product_id(symbol);
        let url = format!("{}/products/{}/stats", self.base_url, id);
        let raw = self.get_json(&url).await?;

        let field = |key: &str| -> ExchangeResult<f64> {
            raw.get(key)
                .and_then(value_f64)
                .ok_or_else(|| ExchangeError::Parse(format!("stats field {} missing", key)))
        };

        Ok(Ticker {
            symbol: symbol.to_string(),
            last: field("last")?,
            high_24h: field("high")?,
            low_24h: field("low")?,
            volume: None,
            base_volume: raw.get("volume").and_then(value_f64),
            quote_volume: None,
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<RawCandle>> {
        let granularity = Self::granularity_secs(timeframe)?;
        let id = to_coinbase_product_id(symbol);
        let url = format!(
            "{}/products/{}/candles?granularity={}",
            self.base_url, id, granularity
        );
        let raw = self.get_json(&url).await?;

        let rows = raw
            .as_array()
            .ok_or_else(|| ExchangeError::Parse("candles response is not an array".to_string()))?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            // [time_s, low, high, open, close, volume], newest first
            let ts = row
                .get(0)
                .and_then(|v| v.as_i64())
                .ok_or_else(|| ExchangeError::Parse("candle row missing timestamp".to_string()))?;
            let num = |idx: usize| -> ExchangeResult<f64> {
                row.get(idx)
                    .and_then(value_f64)
                    .ok_or_else(|| ExchangeError::Parse(format!("candle row field {} missing", idx)))
            };
            candles.push(RawCandle {
                open_time_ms: ts * 1000,
                low: num(1)?,
                high: num(2)?,
                open: num(3)?,
                close: num(4)?,
                volume: num(5)?,
            });
        }

        // Coinbase returns newest first; flip to oldest first, then keep the
        // newest `limit`.
        Ok(oldest_first_window(candles, limit))
    }
}

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::ExchangeError;

use super::types::{MarketInfo, RawCandle, Ticker};

pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Read-only market data capability of one exchange. Adapters are stateless
/// wrappers over the venue's public REST endpoints; all symbols passed in are
/// already in the exchange's native "BASE/QUOTE" form.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    fn name(&self) -> &'static str;

    /// Full market listing, keyed by native symbol.
    async fn load_markets(&self) -> ExchangeResult<HashMap<String, MarketInfo>>;

    /// 24h price/volume snapshot for one symbol.
    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker>;

    /// Up to `limit` candles, oldest first.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<RawCandle>>;
}

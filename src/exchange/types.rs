use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One listed market from the exchange, keyed in the listing by `symbol`.
/// The base/quote assets feed the symbol table's alias construction; request
/// identifiers are derived from the symbol itself (see `exchange::symbols`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Native "BASE/QUOTE" symbol, e.g. "XBT/USD".
    pub symbol: String,
    pub base: String,
    pub quote: String,
}

/// 24h snapshot for one symbol. Venues differ in which volume fields they
/// report; the fetcher resolves the priority order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume: Option<f64>,
    pub base_volume: Option<f64>,
    pub quote_volume: Option<f64>,
}

/// One OHLCV bucket as returned by the venue, timestamp in epoch ms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawCandle {
    pub open_time_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Venues encode numbers as either JSON numbers or strings.
pub(crate) fn value_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Keep the newest `limit` candles of an oldest-first sequence. Used where a
/// venue ignores any count parameter and returns its full window.
pub(crate) fn keep_newest(mut candles: Vec<RawCandle>, limit: u32) -> Vec<RawCandle> {
    let skip = candles.len().saturating_sub(limit as usize);
    candles.split_off(skip)
}

/// Flip a newest-first sequence to oldest-first, then keep the newest
/// `limit`. Used where a venue returns candles most recent first.
pub(crate) fn oldest_first_window(mut candles: Vec<RawCandle>, limit: u32) -> Vec<RawCandle> {
    candles.reverse();
    keep_newest(candles, limit)
}

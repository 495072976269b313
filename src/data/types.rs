use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot produced per price request. Immutable once constructed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceQuote {
    pub requested_symbol: String,
    pub resolved_symbol: String,
    pub last_price: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
    pub timestamp: DateTime<Utc>,
    pub exchange_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Per-symbol failure record used in batch output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceFailure {
    pub symbol: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// One positional entry of a batch price request: either a quote or the
/// failure for that symbol. Serializes flat so batch JSON mirrors the tool
/// interface contract.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum PriceResult {
    Quote(PriceQuote),
    Failure(PriceFailure),
}

impl PriceResult {
    pub fn is_quote(&self) -> bool {
        matches!(self, PriceResult::Quote(_))
    }

    pub fn as_quote(&self) -> Option<&PriceQuote> {
        match self {
            PriceResult::Quote(q) => Some(q),
            PriceResult::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&PriceFailure> {
        match self {
            PriceResult::Quote(_) => None,
            PriceResult::Failure(f) => Some(f),
        }
    }
}

/// Batch result partitioned into successes and failures.
/// `successful_count + failed_count == total_queried` always holds.
#[derive(Clone, Debug, Serialize)]
pub struct MarketSummary {
    pub total_queried: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    pub prices: Vec<PriceQuote>,
    pub errors: Vec<PriceFailure>,
    pub timestamp: DateTime<Utc>,
    pub exchange_name: String,
}

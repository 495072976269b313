//! Crypto market data fetcher with a tool-call dispatch surface.
//!
//! Fetches prices and OHLCV history from a single configured exchange,
//! caches results for a short TTL, and routes named tool calls to the
//! fetcher operations.

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod exchange;
pub mod tools;

// Re-export commonly used types
pub use config::AppConfig;
pub use data::fetcher::DataFetcher;
pub use data::types::{Candle, MarketSummary, PriceFailure, PriceQuote, PriceResult};
pub use error::{ExchangeError, FetchError, SetupError, ToolError};

//! Custom error types for the fetcher
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Fatal startup errors. Anything here aborts initialization.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("exchange '{0}' not supported (expected kraken|binance|coinbase)")]
    UnsupportedExchange(String),
}

/// Errors from the exchange REST layer.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("exchange rejected request: {0}")]
    Api(String),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("unsupported timeframe '{0}'")]
    UnsupportedTimeframe(String),
}

/// Per-request failures reported at the fetcher boundary. Never fatal to the
/// process; batch operations convert these into positional error records.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to fetch price for {symbol}: {source}")]
    Price {
        symbol: String,
        #[source]
        source: ExchangeError,
    },

    #[error("failed to fetch historical data for {symbol}: {source}")]
    History {
        symbol: String,
        #[source]
        source: ExchangeError,
    },

    #[error("candle timestamp out of range for {symbol}")]
    BadTimestamp { symbol: String },
}

/// Dispatcher-level errors, rendered as `{"error": ...}` records and never
/// raised past the dispatch boundary.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

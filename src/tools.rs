//! Tool-call dispatch.
//!
//! Routes a (name, argument-map) pair to the matching fetcher operation for
//! external tool-calling consumers. Every failure mode comes back as an
//! `{"error": ...}` record; nothing here panics or propagates an error past
//! the dispatch boundary.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::fetcher::DataFetcher;
use crate::error::ToolError;

pub struct ToolDispatcher {
    fetcher: Arc<DataFetcher>,
    default_timeframe: String,
    default_limit: u32,
}

impl ToolDispatcher {
    pub fn new(fetcher: Arc<DataFetcher>, config: &AppConfig) -> Self {
        Self {
            fetcher,
            default_timeframe: config.default_timeframe.clone(),
            default_limit: config.default_limit,
        }
    }

    pub async fn dispatch(&self, name: &str, args: &Value) -> Value {
        match self.try_dispatch(name, args).await {
            Ok(result) => result,
            Err(e) => json!({ "error": e.to_string() }),
        }
    }

    async fn try_dispatch(&self, name: &str, args: &Value) -> Result<Value, ToolError> {
        match name {
            "get_crypto_price" => {
                let symbol = require_str(args, "symbol")?;
                match self.fetcher.get_current_price(symbol).await {
                    Ok(quote) => Ok(to_json(&quote)),
                    Err(e) => Ok(json!({ "error": e.to_string() })),
                }
            }
            "get_multiple_prices" => {
                let symbols = require_str_array(args, "symbols")?;
                Ok(to_json(&self.fetcher.get_multiple_prices(&symbols).await))
            }
            "get_historical_data" => {
                let symbol = require_str(args, "symbol")?;
                let timeframe = optional_str(args, "timeframe")?
                    .unwrap_or(&self.default_timeframe)
                    .to_string();
                let limit = optional_u32(args, "limit")?.unwrap_or(self.default_limit);
                match self
                    .fetcher
                    .get_historical_data(symbol, &timeframe, limit)
                    .await
                {
                    Ok(candles) => Ok(to_json(&candles)),
                    Err(e) => Ok(json!({ "error": e.to_string() })),
                }
            }
            "get_market_summary" => {
                let symbols = require_str_array(args, "symbols")?;
                Ok(to_json(&self.fetcher.get_market_summary(&symbols).await))
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

/// Tool descriptors for discovery by tool-calling clients.
pub fn tool_definitions() -> Value {
    json!([
        {
            "name": "get_crypto_price",
            "description": "Current price, 24h high/low and volume for one trading pair",
            "input_schema": {
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Trading pair, e.g. BTC/USDT" }
                },
                "required": ["symbol"]
            }
        },
        {
            "name": "get_multiple_prices",
            "description": "Current prices for several trading pairs; per-symbol failures are reported in place",
            "input_schema": {
                "type": "object",
                "properties": {
                    "symbols": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["symbols"]
            }
        },
        {
            "name": "get_historical_data",
            "description": "OHLCV candles for one trading pair, oldest first",
            "input_schema": {
                "type": "object",
                "properties": {
                    "symbol": { "type": "string" },
                    "timeframe": { "type": "string", "description": "e.g. 1m, 1h, 1d (default 1d)" },
                    "limit": { "type": "integer", "description": "number of candles (default 30)" }
                },
                "required": ["symbol"]
            }
        },
        {
            "name": "get_market_summary",
            "description": "Batch price lookup partitioned into successes and failures",
            "input_schema": {
                "type": "object",
                "properties": {
                    "symbols": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["symbols"]
            }
        }
    ])
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

pub(crate) fn require_str<'a>(args: &'a Value, name: &'static str) -> Result<&'a str, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Err(ToolError::MissingArgument(name)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ToolError::InvalidArgument {
            name,
            reason: "expected a string".to_string(),
        }),
    }
}

pub(crate) fn require_str_array(args: &Value, name: &'static str) -> Result<Vec<String>, ToolError> {
    let items = match args.get(name) {
        None | Some(Value::Null) => return Err(ToolError::MissingArgument(name)),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ToolError::InvalidArgument {
                name,
                reason: "expected an array of strings".to_string(),
            })
        }
    };

    items
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or(ToolError::InvalidArgument {
                name,
                reason: "expected an array of strings".to_string(),
            })
        })
        .collect()
}

pub(crate) fn optional_str<'a>(
    args: &'a Value,
    name: &'static str,
) -> Result<Option<&'a str>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ToolError::InvalidArgument {
            name,
            reason: "expected a string".to_string(),
        }),
    }
}

pub(crate) fn optional_u32(args: &Value, name: &'static str) -> Result<Option<u32>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_u64().and_then(|v| u32::try_from(v).ok()) {
            Some(v) => Ok(Some(v)),
            None => Err(ToolError::InvalidArgument {
                name,
                reason: "expected a non-negative integer".to_string(),
            }),
        },
        Some(_) => Err(ToolError::InvalidArgument {
            name,
            reason: "expected a non-negative integer".to_string(),
        }),
    }
}

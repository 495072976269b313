//! Integration tests wiring the fetcher, cache, symbol table and dispatcher
//! together over a mock exchange.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rust_cryptofetch::config::AppConfig;
use rust_cryptofetch::data::fetcher::DataFetcher;
use rust_cryptofetch::error::ExchangeError;
use rust_cryptofetch::exchange::traits::{ExchangeResult, MarketDataApi};
use rust_cryptofetch::exchange::types::{MarketInfo, RawCandle, Ticker};
use rust_cryptofetch::tools::ToolDispatcher;

const DAY_MS: i64 = 86_400_000;
const BASE_TS_MS: i64 = 1_700_000_000_000;

struct MockExchange {
    markets: Vec<String>,
    fail_symbols: HashSet<String>,
    fail_market_load: bool,
    ticker_volumes: (Option<f64>, Option<f64>, Option<f64>),
    ticker_calls: AtomicUsize,
    ohlcv_calls: AtomicUsize,
}

impl MockExchange {
    fn new(markets: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            markets: markets.iter().map(|s| s.to_string()).collect(),
            fail_symbols: HashSet::new(),
            fail_market_load: false,
            ticker_volumes: (None, Some(123.0), Some(456.0)),
            ticker_calls: AtomicUsize::new(0),
            ohlcv_calls: AtomicUsize::new(0),
        })
    }

    fn failing_for(markets: &[&str], fail: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            markets: markets.iter().map(|s| s.to_string()).collect(),
            fail_symbols: fail.iter().map(|s| s.to_string()).collect(),
            fail_market_load: false,
            ticker_volumes: (None, Some(123.0), Some(456.0)),
            ticker_calls: AtomicUsize::new(0),
            ohlcv_calls: AtomicUsize::new(0),
        })
    }

    fn with_volumes(
        markets: &[&str],
        volumes: (Option<f64>, Option<f64>, Option<f64>),
    ) -> Arc<Self> {
        Arc::new(Self {
            markets: markets.iter().map(|s| s.to_string()).collect(),
            fail_symbols: HashSet::new(),
            fail_market_load: false,
            ticker_volumes: volumes,
            ticker_calls: AtomicUsize::new(0),
            ohlcv_calls: AtomicUsize::new(0),
        })
    }

    fn broken_listing() -> Arc<Self> {
        Arc::new(Self {
            markets: Vec::new(),
            fail_symbols: HashSet::new(),
            fail_market_load: true,
            ticker_volumes: (None, Some(123.0), Some(456.0)),
            ticker_calls: AtomicUsize::new(0),
            ohlcv_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl MarketDataApi for MockExchange {
    fn name(&self) -> &'static str {
        "kraken"
    }

    async fn load_markets(&self) -> ExchangeResult<HashMap<String, MarketInfo>> {
        if self.fail_market_load {
            return Err(ExchangeError::Api("EService:Unavailable".to_string()));
        }
        Ok(self
            .markets
            .iter()
            .map(|symbol| {
                let (base, quote) = symbol.split_once('/').unwrap();
                (
                    symbol.clone(),
                    MarketInfo {
                        symbol: symbol.clone(),
                        base: base.to_string(),
                        quote: quote.to_string(),
                    },
                )
            })
            .collect())
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_symbols.contains(symbol) || !self.markets.contains(&symbol.to_string()) {
            return Err(ExchangeError::Api(format!(
                "EQuery:Unknown asset pair: {}",
                symbol
            )));
        }
        let (volume, base_volume, quote_volume) = self.ticker_volumes;
        Ok(Ticker {
            symbol: symbol.to_string(),
            last: 50_000.0,
            high_24h: 51_000.0,
            low_24h: 49_000.0,
            volume,
            base_volume,
            quote_volume,
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        _timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<RawCandle>> {
        self.ohlcv_calls.fetch_add(1, Ordering::SeqCst);
        if !self.markets.contains(&symbol.to_string()) {
            return Err(ExchangeError::Api(format!(
                "EQuery:Unknown asset pair: {}",
                symbol
            )));
        }
        Ok((0..limit as i64)
            .map(|i| RawCandle {
                open_time_ms: BASE_TS_MS + i * DAY_MS,
                open: 100.0 + i as f64,
                high: 101.0 + i as f64,
                low: 99.0 + i as f64,
                close: 100.5 + i as f64,
                volume: 10.0 * (i + 1) as f64,
            })
            .collect())
    }
}

fn config_with_ttl(secs: u64) -> AppConfig {
    AppConfig {
        cache_ttl_secs: secs,
        ..AppConfig::default()
    }
}

async fn fetcher_over(mock: Arc<MockExchange>, ttl_secs: u64) -> DataFetcher {
    DataFetcher::connect(mock, &config_with_ttl(ttl_secs)).await
}

/// Two price calls inside the TTL window: identical results, one remote call.
#[tokio::test]
async fn test_cache_idempotence() {
    let mock = MockExchange::new(&["XBT/USD", "ETH/USD"]);
    let fetcher = fetcher_over(mock.clone(), 60).await;

    let first = fetcher.get_current_price("BTC/USD").await.unwrap();
    let second = fetcher.get_current_price("BTC/USD").await.unwrap();

    assert_eq!(first.last_price, second.last_price);
    assert_eq!(first.timestamp, second.timestamp);
    assert_eq!(mock.ticker_calls.load(Ordering::SeqCst), 1);
}

/// With an expired entry, a repeat call issues exactly one new remote call.
#[tokio::test]
async fn test_cache_expiry_forces_refetch() {
    let mock = MockExchange::new(&["XBT/USD"]);
    let fetcher = fetcher_over(mock.clone(), 0).await;

    fetcher.get_current_price("BTC/USD").await.unwrap();
    fetcher.get_current_price("BTC/USD").await.unwrap();

    assert_eq!(mock.ticker_calls.load(Ordering::SeqCst), 2);
}

/// History results are cached under their own key.
#[tokio::test]
async fn test_history_cache_hit() {
    let mock = MockExchange::new(&["XBT/USD"]);
    let fetcher = fetcher_over(mock.clone(), 60).await;

    let first = fetcher.get_historical_data("BTC/USD", "1d", 7).await.unwrap();
    let second = fetcher.get_historical_data("BTC/USD", "1d", 7).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(mock.ohlcv_calls.load(Ordering::SeqCst), 1);

    // A different limit is a different key and a new remote call.
    fetcher.get_historical_data("BTC/USD", "1d", 5).await.unwrap();
    assert_eq!(mock.ohlcv_calls.load(Ordering::SeqCst), 2);
}

/// The quote records both the requested and the resolved symbol.
#[tokio::test]
async fn test_normalization_in_quote() {
    let mock = MockExchange::new(&["XBT/USD", "ETH/USD"]);
    let fetcher = fetcher_over(mock, 60).await;

    let quote = fetcher.get_current_price("BTC/USD").await.unwrap();
    assert_eq!(quote.requested_symbol, "BTC/USD");
    assert_eq!(quote.resolved_symbol, "XBT/USD");
    assert_eq!(quote.exchange_name, "kraken");

    // Already-native symbols pass through untouched.
    let quote = fetcher.get_current_price("ETH/USD").await.unwrap();
    assert_eq!(quote.resolved_symbol, "ETH/USD");
}

/// Unknown symbols are not normalized; the remote call reports the failure
/// and the error carries the requested symbol.
#[tokio::test]
async fn test_unknown_symbol_error_carries_symbol() {
    let mock = MockExchange::new(&["XBT/USD"]);
    let fetcher = fetcher_over(mock, 60).await;

    let err = fetcher.get_current_price("DOGE/EUR").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("DOGE/EUR"), "unexpected message: {}", msg);
    assert!(msg.contains("Unknown asset pair"), "unexpected message: {}", msg);
}

/// Volume priority: primary, then base, then quote, then zero.
#[tokio::test]
async fn test_volume_priority_chain() {
    let cases = [
        ((Some(9.0), Some(123.0), Some(456.0)), 9.0),
        ((None, Some(123.0), Some(456.0)), 123.0),
        ((None, None, Some(456.0)), 456.0),
        ((None, None, None), 0.0),
    ];

    for (volumes, expected) in cases {
        let mock = MockExchange::with_volumes(&["XBT/USD"], volumes);
        let fetcher = fetcher_over(mock, 60).await;
        let quote = fetcher.get_current_price("XBT/USD").await.unwrap();
        assert_eq!(quote.volume_24h, expected, "volumes {:?}", volumes);
    }
}

/// Given [A, B, C] where B fails, three entries come back in order with the
/// second marked as an error.
#[tokio::test]
async fn test_batch_isolation_preserves_order() {
    let mock = MockExchange::failing_for(&["XBT/USD", "ETH/USD", "LTC/USD"], &["ETH/USD"]);
    let fetcher = fetcher_over(mock, 60).await;

    let symbols = vec![
        "XBT/USD".to_string(),
        "ETH/USD".to_string(),
        "LTC/USD".to_string(),
    ];
    let results = fetcher.get_multiple_prices(&symbols).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_quote());
    assert!(!results[1].is_quote());
    assert!(results[2].is_quote());

    let failure = results[1].as_failure().unwrap();
    assert_eq!(failure.symbol, "ETH/USD");
    assert!(failure.error.contains("ETH/USD"));
    assert_eq!(results[2].as_quote().unwrap().requested_symbol, "LTC/USD");
}

/// Exactly `limit` candles, non-decreasing timestamps, last close matches the
/// newest market candle.
#[tokio::test]
async fn test_historical_ordering() {
    let mock = MockExchange::new(&["XBT/USD"]);
    let fetcher = fetcher_over(mock, 60).await;

    let candles = fetcher.get_historical_data("BTC/USD", "1d", 7).await.unwrap();
    assert_eq!(candles.len(), 7);

    for pair in candles.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    assert_eq!(candles.last().unwrap().close, 100.5 + 6.0);
    assert_eq!(
        candles[0].timestamp.timestamp_millis(),
        BASE_TS_MS
    );
}

/// successful_count + failed_count == total_queried.
#[tokio::test]
async fn test_market_summary_arithmetic() {
    let mock = MockExchange::failing_for(&["XBT/USD", "ETH/USD", "LTC/USD"], &["LTC/USD"]);
    let fetcher = fetcher_over(mock, 60).await;

    let symbols = vec![
        "XBT/USD".to_string(),
        "ETH/USD".to_string(),
        "LTC/USD".to_string(),
        "DOGE/EUR".to_string(),
    ];
    let summary = fetcher.get_market_summary(&symbols).await;

    assert_eq!(summary.total_queried, 4);
    assert_eq!(
        summary.successful_count + summary.failed_count,
        summary.total_queried
    );
    assert_eq!(summary.successful_count, 2);
    assert_eq!(summary.prices.len(), summary.successful_count);
    assert_eq!(summary.errors.len(), summary.failed_count);
    assert_eq!(summary.exchange_name, "kraken");
}

/// A failed market listing degrades normalization to pass-through instead of
/// aborting startup.
#[tokio::test]
async fn test_market_load_failure_degrades_to_passthrough() {
    let mock = MockExchange::broken_listing();
    let fetcher = fetcher_over(mock, 60).await;

    assert!(fetcher.get_available_symbols(None).is_empty());
    let err = fetcher.get_current_price("BTC/USD").await.unwrap_err();
    assert!(err.to_string().contains("BTC/USD"));
}

#[tokio::test]
async fn test_available_symbols_prefix_filter() {
    let mock = MockExchange::new(&["XBT/USD", "XBT/EUR", "ETH/USD"]);
    let fetcher = fetcher_over(mock, 60).await;

    assert_eq!(
        fetcher.get_available_symbols(Some("XBT")),
        vec!["XBT/EUR", "XBT/USD"]
    );
    assert_eq!(fetcher.get_available_symbols(None).len(), 3);
}

/// Unknown exchange names fail at startup; known ones build their adapter.
#[test]
fn test_exchange_registry() {
    use rust_cryptofetch::error::SetupError;
    use rust_cryptofetch::exchange::factory::build_exchange;

    let config = AppConfig {
        exchange: "bitmex".to_string(),
        ..AppConfig::default()
    };
    assert!(matches!(
        build_exchange(&config),
        Err(SetupError::UnsupportedExchange(name)) if name == "bitmex"
    ));

    for name in ["kraken", "Binance", "coinbase"] {
        let config = AppConfig {
            exchange: name.to_string(),
            ..AppConfig::default()
        };
        let exchange = build_exchange(&config).unwrap();
        assert_eq!(exchange.name(), name.to_lowercase());
    }
}

/// Dispatching an unrecognized tool returns an error record, never panics.
#[tokio::test]
async fn test_dispatch_unknown_tool() {
    let mock = MockExchange::new(&["XBT/USD"]);
    let fetcher = Arc::new(fetcher_over(mock, 60).await);
    let dispatcher = ToolDispatcher::new(fetcher, &AppConfig::default());

    let result = dispatcher
        .dispatch("nonexistent_tool", &json!({ "symbol": "BTC/USD" }))
        .await;

    assert_eq!(
        result["error"].as_str().unwrap(),
        "Unknown tool: nonexistent_tool"
    );
}

#[tokio::test]
async fn test_dispatch_missing_argument() {
    let mock = MockExchange::new(&["XBT/USD"]);
    let fetcher = Arc::new(fetcher_over(mock, 60).await);
    let dispatcher = ToolDispatcher::new(fetcher, &AppConfig::default());

    let result = dispatcher.dispatch("get_crypto_price", &json!({})).await;
    assert_eq!(
        result["error"].as_str().unwrap(),
        "missing required argument: symbol"
    );
}

#[tokio::test]
async fn test_dispatch_price_tool() {
    let mock = MockExchange::new(&["XBT/USD"]);
    let fetcher = Arc::new(fetcher_over(mock, 60).await);
    let dispatcher = ToolDispatcher::new(fetcher, &AppConfig::default());

    let result = dispatcher
        .dispatch("get_crypto_price", &json!({ "symbol": "BTC/USD" }))
        .await;

    assert_eq!(result["requested_symbol"], "BTC/USD");
    assert_eq!(result["resolved_symbol"], "XBT/USD");
    assert_eq!(result["last_price"], 50_000.0);
    assert!(result.get("error").is_none());
}

/// Omitted optional arguments fall back to the configured defaults.
#[tokio::test]
async fn test_dispatch_history_defaults() {
    let mock = MockExchange::new(&["XBT/USD"]);
    let fetcher = Arc::new(fetcher_over(mock, 60).await);
    let dispatcher = ToolDispatcher::new(fetcher, &AppConfig::default());

    let result = dispatcher
        .dispatch("get_historical_data", &json!({ "symbol": "XBT/USD" }))
        .await;

    let candles = result.as_array().expect("expected candle array");
    assert_eq!(candles.len(), 30);
    assert!(candles[0]["timestamp"].is_string());
}

/// A remote failure inside a tool call becomes an error record too.
#[tokio::test]
async fn test_dispatch_remote_failure_is_error_record() {
    let mock = MockExchange::failing_for(&["XBT/USD"], &["XBT/USD"]);
    let fetcher = Arc::new(fetcher_over(mock, 60).await);
    let dispatcher = ToolDispatcher::new(fetcher, &AppConfig::default());

    let result = dispatcher
        .dispatch("get_crypto_price", &json!({ "symbol": "BTC/USD" }))
        .await;

    let msg = result["error"].as_str().unwrap();
    assert!(msg.contains("BTC/USD"));
}

/// Batch tool output keeps per-symbol failures positional.
#[tokio::test]
async fn test_dispatch_multiple_prices() {
    let mock = MockExchange::failing_for(&["XBT/USD", "ETH/USD"], &["ETH/USD"]);
    let fetcher = Arc::new(fetcher_over(mock, 60).await);
    let dispatcher = ToolDispatcher::new(fetcher, &AppConfig::default());

    let result = dispatcher
        .dispatch(
            "get_multiple_prices",
            &json!({ "symbols": ["XBT/USD", "ETH/USD"] }),
        )
        .await;

    let entries = result.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].get("last_price").is_some());
    assert!(entries[1].get("error").is_some());
    assert_eq!(entries[1]["symbol"], "ETH/USD");
}

#[tokio::test]
async fn test_dispatch_market_summary() {
    let mock = MockExchange::new(&["XBT/USD", "ETH/USD"]);
    let fetcher = Arc::new(fetcher_over(mock, 60).await);
    let dispatcher = ToolDispatcher::new(fetcher, &AppConfig::default());

    let result = dispatcher
        .dispatch(
            "get_market_summary",
            &json!({ "symbols": ["XBT/USD", "ETH/USD", "NOPE/NOPE"] }),
        )
        .await;

    assert_eq!(result["total_queried"], 3);
    assert_eq!(result["successful_count"], 2);
    assert_eq!(result["failed_count"], 1);
}

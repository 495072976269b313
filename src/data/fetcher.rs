//! Single entry point for price and history queries.
//!
//! Composes the symbol table, the result cache and the exchange client:
//! normalize, check cache, one remote call, shape, cache, return. No retries
//! and no backoff anywhere; a remote failure is reported once.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::exchange::symbols::SymbolTable;
use crate::exchange::traits::MarketDataApi;

use super::cache::{CachedValue, ResultCache};
use super::types::{Candle, MarketSummary, PriceFailure, PriceQuote, PriceResult};

pub struct DataFetcher {
    exchange: Arc<dyn MarketDataApi>,
    exchange_name: String,
    symbols: SymbolTable,
    cache: ResultCache,
}

impl DataFetcher {
    /// Load the market listing once and build the symbol table. A listing
    /// failure is not fatal: normalization degrades to pass-through and
    /// every lookup falls back to the caller's symbol as-is.
    pub async fn connect(exchange: Arc<dyn MarketDataApi>, config: &AppConfig) -> Self {
        let exchange_name = exchange.name().to_string();

        let symbols = match exchange.load_markets().await {
            Ok(markets) => {
                info!(
                    exchange = %exchange_name,
                    markets = markets.len(),
                    "loaded market listing"
                );
                SymbolTable::build(&exchange_name, &markets)
            }
            Err(e) => {
                warn!(
                    exchange = %exchange_name,
                    error = %e,
                    "market listing failed; symbol normalization degraded to pass-through"
                );
                SymbolTable::empty(&exchange_name)
            }
        };

        Self {
            exchange,
            exchange_name,
            symbols,
            cache: ResultCache::new(config.cache_ttl()),
        }
    }

    pub fn exchange_name(&self) -> &str {
        &self.exchange_name
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }

    pub async fn get_current_price(&self, symbol: &str) -> Result<PriceQuote, FetchError> {
        let key = ResultCache::price_key(symbol);
        if let Some(CachedValue::Quote(quote)) = self.cache.get(&key) {
            debug!(%symbol, "price cache hit");
            return Ok(quote);
        }

        let resolved = self.symbols.resolve(symbol);
        let ticker = self
            .exchange
            .fetch_ticker(&resolved)
            .await
            .map_err(|source| FetchError::Price {
                symbol: symbol.to_string(),
                source,
            })?;

        // Volume priority: primary field, then base-asset, then quote-asset.
        let volume_24h = ticker
            .volume
            .or(ticker.base_volume)
            .or(ticker.quote_volume)
            .unwrap_or(0.0);

        let quote = PriceQuote {
            requested_symbol: symbol.to_string(),
            resolved_symbol: resolved,
            last_price: ticker.last,
            high_24h: ticker.high_24h,
            low_24h: ticker.low_24h,
            volume_24h,
            timestamp: Utc::now(),
            exchange_name: self.exchange_name.clone(),
        };

        self.cache.put(key, CachedValue::Quote(quote.clone()));
        Ok(quote)
    }

    /// One entry per input symbol, in input order. A failure for one symbol
    /// never aborts the others; each is fetched sequentially.
    pub async fn get_multiple_prices(&self, symbols: &[String]) -> Vec<PriceResult> {
        let mut results = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.get_current_price(symbol).await {
                Ok(quote) => results.push(PriceResult::Quote(quote)),
                Err(e) => {
                    error!(%symbol, error = %e, "price fetch failed");
                    results.push(PriceResult::Failure(PriceFailure {
                        symbol: symbol.clone(),
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    }));
                }
            }
        }
        results
    }

    /// Candles oldest first, exactly as the exchange returned them.
    pub async fn get_historical_data(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, FetchError> {
        let key = ResultCache::history_key(symbol, timeframe, limit);
        if let Some(CachedValue::Candles(candles)) = self.cache.get(&key) {
            debug!(%symbol, %timeframe, limit, "history cache hit");
            return Ok(candles);
        }

        let resolved = self.symbols.resolve(symbol);
        let raw = self
            .exchange
            .fetch_ohlcv(&resolved, timeframe, limit)
            .await
            .map_err(|source| FetchError::History {
                symbol: symbol.to_string(),
                source,
            })?;

        let mut candles = Vec::with_capacity(raw.len());
        for rc in raw {
            let timestamp = DateTime::<Utc>::from_timestamp_millis(rc.open_time_ms).ok_or(
                FetchError::BadTimestamp {
                    symbol: symbol.to_string(),
                },
            )?;
            candles.push(Candle {
                timestamp,
                open: rc.open,
                high: rc.high,
                low: rc.low,
                close: rc.close,
                volume: rc.volume,
            });
        }

        self.cache.put(key, CachedValue::Candles(candles.clone()));
        Ok(candles)
    }

    /// Pure reshaping of `get_multiple_prices`; no additional remote calls.
    pub async fn get_market_summary(&self, symbols: &[String]) -> MarketSummary {
        let results = self.get_multiple_prices(symbols).await;

        let mut prices = Vec::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                PriceResult::Quote(q) => prices.push(q),
                PriceResult::Failure(f) => errors.push(f),
            }
        }

        MarketSummary {
            total_queried: symbols.len(),
            successful_count: prices.len(),
            failed_count: errors.len(),
            prices,
            errors,
            timestamp: Utc::now(),
            exchange_name: self.exchange_name.clone(),
        }
    }

    /// Native symbols from the listing captured at startup.
    pub fn get_available_symbols(&self, prefix: Option<&str>) -> Vec<String> {
        self.symbols.native_symbols(prefix)
    }
}

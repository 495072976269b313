//! Symbol normalization.
//!
//! Canonical symbol (used by callers): "BASE/QUOTE" like "BTC/USDT".
//!
//! Request-id mappings:
//! - Kraken/Binance: slash stripped, "XBTUSD" / "BTCUSDT"
//! - Coinbase: "BTC-USD"
//!
//! Kraken prefers XBT for BTC, so the table carries BTC aliases and the
//! resolver probes quote-currency variations against the live listing.

use std::collections::{HashMap, HashSet};

use super::types::MarketInfo;

pub fn to_kraken_pair(symbol: &str) -> String {
    symbol.replace('/', "")
}

pub fn to_binance_symbol(symbol: &str) -> String {
    symbol.replace('/', "")
}

pub fn to_coinbase_product_id(symbol: &str) -> String {
    symbol.replace('/', "-")
}

/// Alias table built once from the market listing at startup and never
/// refreshed. Duplicate aliases silently overwrite.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    exchange: String,
    aliases: HashMap<String, String>,
    native: HashSet<String>,
}

impl SymbolTable {
    pub fn build(exchange: &str, markets: &HashMap<String, MarketInfo>) -> Self {
        let mut aliases = HashMap::new();
        let mut native = HashSet::new();

        for (symbol, info) in markets {
            native.insert(symbol.clone());
            aliases.insert(symbol.clone(), symbol.clone());

            if info.base == "XBT" {
                aliases.insert(format!("BTC/{}", info.quote), symbol.clone());
            }
        }

        Self {
            exchange: exchange.to_string(),
            aliases,
            native,
        }
    }

    /// Table with no markets; every lookup passes through unchanged.
    pub fn empty(exchange: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
            aliases: HashMap::new(),
            native: HashSet::new(),
        }
    }

    /// Resolve a user symbol to the exchange's native form.
    ///
    /// Lookup order: exact alias match, then (Kraken only) base/quote
    /// substitutions probed against the live listing. No match returns the
    /// input unchanged and the remote call surfaces the failure.
    pub fn resolve(&self, symbol: &str) -> String {
        if let Some(native) = self.aliases.get(symbol) {
            return native.clone();
        }

        if self.exchange == "kraken" {
            let variations = [
                symbol.to_string(),
                symbol.replace("BTC", "XBT"),
                symbol.replace("/USD", "/USDT"),
                symbol.replace("/USDT", "/USD"),
                symbol.replace("BTC", "XBT").replace("/USD", "/USDT"),
            ];

            for candidate in variations {
                if self.native.contains(&candidate) {
                    return candidate;
                }
            }
        }

        symbol.to_string()
    }

    /// Native symbols, sorted, optionally filtered by prefix.
    pub fn native_symbols(&self, prefix: Option<&str>) -> Vec<String> {
        let mut out: Vec<String> = match prefix {
            Some(p) => self
                .native
                .iter()
                .filter(|s| s.starts_with(p))
                .cloned()
                .collect(),
            None => self.native.iter().cloned().collect(),
        };
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.native.len()
    }

    pub fn is_empty(&self) -> bool {
        self.native.is_empty()
    }
}

use std::sync::Arc;

use crate::{config::AppConfig, error::SetupError};

use super::{
    binance::BinanceExchange,
    coinbase::CoinbaseExchange,
    kraken::KrakenExchange,
    traits::MarketDataApi,
};

/// Explicit registry from exchange name to adapter. Unknown names fail at
/// startup with `UnsupportedExchange`.
pub fn build_exchange(config: &AppConfig) -> Result<Arc<dyn MarketDataApi>, SetupError> {
    match config.exchange.to_lowercase().as_str() {
        "kraken" => Ok(Arc::new(KrakenExchange::new(config))),
        "binance" => Ok(Arc::new(BinanceExchange::new(config))),
        "coinbase" => Ok(Arc::new(CoinbaseExchange::new(config))),
        other => Err(SetupError::UnsupportedExchange(other.to_string())),
    }
}

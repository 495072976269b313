use serde::Deserialize;
use std::env;
use std::fs;
use std::time::Duration;

/// Base-url override for a single exchange.
#[derive(Clone, Debug, Deserialize)]
pub struct ExchangeEndpoint {
    pub base_url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// "kraken", "binance" or "coinbase"
    pub exchange: String,

    /// How long a fetched result stays valid in the cache.
    pub cache_ttl_secs: u64,

    /// Upper bound on a single remote call.
    pub request_timeout_ms: u64,

    pub listen_addr: String,

    /// Defaults applied when a tool call omits the optional arguments.
    pub default_timeframe: String,
    pub default_limit: u32,

    pub kraken: Option<ExchangeEndpoint>,
    pub binance: Option<ExchangeEndpoint>,
    pub coinbase: Option<ExchangeEndpoint>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exchange: "kraken".to_string(),
            cache_ttl_secs: 60,
            request_timeout_ms: 30_000,
            listen_addr: "0.0.0.0:3000".to_string(),
            default_timeframe: "1d".to_string(),
            default_limit: 30,
            kraken: None,
            binance: None,
            coinbase: None,
        }
    }
}

impl AppConfig {
    /// Read config.yaml from the working directory; a missing file means
    /// defaults. The EXCHANGE env var overrides the configured exchange.
    pub fn load() -> Self {
        let mut config = match fs::read_to_string("config.yaml") {
            Ok(content) => {
                // Strip BOM if present
                let content = content.strip_prefix("\u{feff}").unwrap_or(&content);
                serde_yaml::from_str(content).expect("Failed to parse config.yaml")
            }
            Err(_) => AppConfig::default(),
        };

        if let Ok(exchange) = env::var("EXCHANGE") {
            config.exchange = exchange;
        }
        config
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

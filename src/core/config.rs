//! Configuration - Type-safe, validated config

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,

    /// Market data source
    pub market: MarketConfig,

    /// Polling driver
    pub poll: PollConfig,

    /// Signal/order engine thresholds
    pub engine: EngineConfig,

    /// Chat gateway wiring
    pub chat: Option<ChatConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log filter (tracing EnvFilter syntax)
    pub log_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Use the exchange testnet endpoints
    pub testnet: bool,

    /// Symbols the poller watches
    pub symbols: Vec<String>,

    /// HTTP request timeout
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between polling cycles
    pub interval_secs: u64,
}

/// Engine thresholds. Defaults are the product constants; config only makes
/// them visible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Absolute 24h change (%) a snapshot must exceed to qualify
    pub min_change_percent: Decimal,

    /// 24h base-asset volume a snapshot must exceed to qualify
    pub min_volume: Decimal,

    /// Max distance (%) between market and order price for a fill
    pub fill_tolerance_percent: Decimal,

    /// Pending orders older than this are cancelled on evaluation
    pub order_expiry_minutes: i64,

    /// Default window for active-signal queries
    pub signal_window_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Bot token (loaded from env if not provided)
    pub bot_token: Option<String>,

    /// Channel the relay posts into
    pub channel: String,

    /// Enable unsolicited signal/fill notifications
    pub notifications: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            market: MarketConfig::default(),
            poll: PollConfig::default(),
            engine: EngineConfig::default(),
            chat: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,market_relay=debug".to_string(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            testnet: false,
            symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            request_timeout_secs: 10,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_change_percent: Decimal::from(5),
            min_volume: Decimal::ONE_THOUSAND,
            fill_tolerance_percent: Decimal::ONE,
            order_expiry_minutes: 5,
            signal_window_minutes: 10,
        }
    }
}

impl Config {
    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> crate::core::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::core::Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| crate::core::Error::Config(format!("Failed to parse config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_product_constants() {
        let engine = EngineConfig::default();
        assert_eq!(engine.min_change_percent, Decimal::from(5));
        assert_eq!(engine.min_volume, Decimal::from(1000));
        assert_eq!(engine.fill_tolerance_percent, Decimal::ONE);
        assert_eq!(engine.order_expiry_minutes, 5);
        assert_eq!(engine.signal_window_minutes, 10);
        assert_eq!(PollConfig::default().interval_secs, 300);
    }

    #[test]
    fn test_parse_partial_toml() {
        let cfg: Config = toml::from_str(
            r#"
            [market]
            testnet = true
            symbols = ["SOLUSDT"]

            [poll]
            interval_secs = 60

            [engine]
            min_change_percent = 3.0
            "#,
        )
        .unwrap();
        assert!(cfg.market.testnet);
        assert_eq!(cfg.market.symbols, vec!["SOLUSDT"]);
        assert_eq!(cfg.poll.interval_secs, 60);
        assert_eq!(cfg.engine.min_change_percent, Decimal::from(3));
        // Untouched sections keep their defaults
        assert_eq!(cfg.engine.order_expiry_minutes, 5);
        assert!(cfg.chat.is_none());
    }

    #[test]
    fn test_load_accepts_any_path_like() {
        let path = std::env::temp_dir().join("market-relay-config-test.toml");
        std::fs::write(&path, "[poll]\ninterval_secs = 30\n").unwrap();

        // Borrowed paths and plain strings both work
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.poll.interval_secs, 30);
        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.poll.interval_secs, 30);

        std::fs::remove_file(&path).ok();
    }
}

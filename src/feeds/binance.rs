//! Binance spot REST market data client

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use crate::core::{Error, MarketConfig, Result, Symbol, TickerSnapshot};
use crate::feeds::MarketFeed;

const MAINNET_URL: &str = "https://api.binance.com/api";
const TESTNET_URL: &str = "https://testnet.binance.vision/api";

/// REST market feed against the Binance public endpoints.
/// Only unauthenticated market-data routes are used; no request signing.
pub struct BinanceFeed {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PriceQuote {
    price: String,
}

impl BinanceFeed {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base_url = if config.testnet { TESTNET_URL } else { MAINNET_URL };
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Point the client at an arbitrary host (local stubs in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MarketFeed for BinanceFeed {
    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<TickerSnapshot> {
        let url = format!("{}/v3/ticker/24hr?symbol={}", self.base_url(), symbol);
        let snapshot = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<TickerSnapshot>()
            .await?;
        Ok(snapshot)
    }

    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal> {
        let url = format!("{}/v3/ticker/price?symbol={}", self.base_url(), symbol);
        let quote = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<PriceQuote>()
            .await?;
        quote.price.parse().map_err(|_| {
            Error::Exchange(format!(
                "unparseable price '{}' for {symbol}",
                quote.price
            ))
        })
    }

    fn name(&self) -> &str {
        "binance"
    }
}

//! Market data feeds

pub mod binance;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::{Result, Symbol, TickerSnapshot};

pub use binance::BinanceFeed;

/// Market data source - implemented by exchange clients
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Fetch the rolling 24h ticker for a symbol
    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<TickerSnapshot>;

    /// Fetch just the current price for a symbol
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal>;

    /// Feed name for logging
    fn name(&self) -> &str;
}

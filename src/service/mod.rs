//! Relay service: one task owning the engine.
//!
//! All engine access funnels through this task. A poll tick drives signal
//! generation and fill simulation; chat-originated intents arrive on an mpsc
//! channel carrying oneshot reply slots. Serializing both through a single
//! owner keeps the engine free of locks.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::chat::{render, ChatGateway};
use crate::core::{Config, OrderStatus, PseudoOrder, Result, Side, Signal, Symbol};
use crate::engine::SignalEngine;
use crate::feeds::MarketFeed;

/// Intents sent from chat handlers to the engine task.
#[derive(Debug)]
pub enum EngineCommand {
    /// Pass-through price lookup; does not touch engine state
    Price {
        symbol: Symbol,
        respond_to: oneshot::Sender<Result<Decimal>>,
    },
    /// Create a pseudo-order for a validated side/symbol/quantity
    PlaceOrder {
        side: Side,
        symbol: Symbol,
        quantity: Decimal,
        respond_to: oneshot::Sender<Result<PseudoOrder>>,
    },
    /// Snapshot of active signals and pending orders
    Dashboard {
        respond_to: oneshot::Sender<Dashboard>,
    },
}

/// Engine state snapshot for rendering.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub signals: Vec<Signal>,
    pub orders: Vec<PseudoOrder>,
}

pub struct RelayService {
    engine: SignalEngine,
    feed: Arc<dyn MarketFeed>,
    gateway: Arc<dyn ChatGateway>,
    symbols: Vec<Symbol>,
    poll_interval: Duration,
    commands: mpsc::Receiver<EngineCommand>,
}

impl RelayService {
    pub fn new(
        config: &Config,
        engine: SignalEngine,
        feed: Arc<dyn MarketFeed>,
        gateway: Arc<dyn ChatGateway>,
    ) -> (Self, mpsc::Sender<EngineCommand>) {
        let (tx, rx) = mpsc::channel(64);
        let service = Self {
            engine,
            feed,
            gateway,
            symbols: config.market.symbols.iter().map(|s| Symbol::new(s.as_str())).collect(),
            poll_interval: Duration::from_secs(config.poll.interval_secs),
            commands: rx,
        };
        (service, tx)
    }

    /// Run until the command channel closes. The first poll fires
    /// immediately, then every `poll_interval`.
    pub async fn run(mut self) {
        info!(
            feed = self.feed.name(),
            symbols = self.symbols.len(),
            interval_secs = self.poll_interval.as_secs(),
            "relay service starting"
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll_once().await,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
            }
        }
        info!("relay service stopped");
    }

    /// One polling cycle: evaluate every watched symbol for fresh signals,
    /// then drive every pending order against a fresh price. A failure on
    /// one symbol or order is logged and skipped; the cycle continues.
    pub async fn poll_once(&mut self) {
        for symbol in self.symbols.clone() {
            match self.feed.fetch_ticker(&symbol).await {
                Ok(ticker) => {
                    if let Some(signal) = self.engine.generate_signal(&ticker) {
                        self.notify(&render::signal_alert(&signal)).await;
                    }
                }
                Err(e) => warn!(symbol = %symbol, error = %e, "ticker fetch failed, skipping"),
            }
        }

        for order in self.engine.pending_orders() {
            let market_price = match self.feed.fetch_price(&order.symbol).await {
                Ok(price) => price,
                Err(e) => {
                    warn!(order = %order.id, error = %e, "price fetch failed, skipping");
                    continue;
                }
            };
            match self.engine.simulate_fill(&order.id, market_price) {
                Ok(true) => {
                    let message = self.engine.order(&order.id).map(render::order_filled);
                    if let Some(message) = message {
                        self.notify(&message).await;
                    }
                }
                Ok(false) => {
                    let cancelled = self
                        .engine
                        .order(&order.id)
                        .is_some_and(|o| o.status == OrderStatus::Cancelled);
                    if cancelled {
                        self.notify(&render::order_cancelled(&order)).await;
                    }
                }
                Err(e) => {
                    // Corrupt order state; report it rather than retry
                    error!(order = %order.id, error = %e, "fill simulation failed");
                    self.notify(&render::error_reply(&e.to_string())).await;
                }
            }
        }
    }

    pub async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Price { symbol, respond_to } => {
                let result = self.feed.fetch_price(&symbol).await;
                let _ = respond_to.send(result);
            }
            EngineCommand::PlaceOrder { side, symbol, quantity, respond_to } => {
                let result = self.place_order(side, symbol, quantity).await;
                let _ = respond_to.send(result);
            }
            EngineCommand::Dashboard { respond_to } => {
                let _ = respond_to.send(Dashboard {
                    signals: self.engine.active_signals(),
                    orders: self.engine.pending_orders(),
                });
            }
        }
    }

    /// Price the order off the newest matching active signal, falling back
    /// to the live market price when no signal is fresh enough.
    async fn place_order(
        &mut self,
        side: Side,
        symbol: Symbol,
        quantity: Decimal,
    ) -> Result<PseudoOrder> {
        let signal = match self.engine.latest_active_signal(&symbol, side) {
            Some(signal) => signal,
            None => {
                let price = self.feed.fetch_price(&symbol).await?;
                Signal {
                    symbol: symbol.clone(),
                    side,
                    price,
                    change_percent: Decimal::ZERO,
                    volume: Decimal::ZERO,
                    created_at: Utc::now(),
                    confidence: Decimal::ZERO,
                }
            }
        };
        Ok(self.engine.create_order(&signal, quantity))
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.gateway.send(message).await {
            warn!(error = %e, "outbound chat send failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::test_support::RecordingGateway;
    use crate::core::{EngineConfig, Error, TickerSnapshot};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeFeed {
        tickers: Mutex<HashMap<String, TickerSnapshot>>,
        prices: Mutex<HashMap<String, Decimal>>,
    }

    impl FakeFeed {
        fn new() -> Self {
            Self {
                tickers: Mutex::new(HashMap::new()),
                prices: Mutex::new(HashMap::new()),
            }
        }

        fn set_ticker(&self, symbol: &str, last: &str, change: &str, volume: &str) {
            self.tickers.lock().unwrap().insert(
                symbol.to_string(),
                TickerSnapshot {
                    symbol: symbol.to_string(),
                    last_price: last.to_string(),
                    price_change_percent: change.to_string(),
                    volume: volume.to_string(),
                },
            );
        }

        fn set_price(&self, symbol: &str, price: &str) {
            self.prices
                .lock()
                .unwrap()
                .insert(symbol.to_string(), price.parse().unwrap());
        }
    }

    #[async_trait]
    impl MarketFeed for FakeFeed {
        async fn fetch_ticker(&self, symbol: &Symbol) -> Result<TickerSnapshot> {
            self.tickers
                .lock()
                .unwrap()
                .get(symbol.as_str())
                .cloned()
                .ok_or_else(|| Error::Exchange(format!("no ticker for {symbol}")))
        }

        async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal> {
            self.prices
                .lock()
                .unwrap()
                .get(symbol.as_str())
                .copied()
                .ok_or_else(|| Error::Exchange(format!("no price for {symbol}")))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn config(symbols: &[&str]) -> Config {
        let mut config = Config::default();
        config.market.symbols = symbols.iter().map(|s| s.to_string()).collect();
        config
    }

    fn service(
        symbols: &[&str],
    ) -> (RelayService, mpsc::Sender<EngineCommand>, Arc<FakeFeed>, Arc<RecordingGateway>) {
        let feed = Arc::new(FakeFeed::new());
        let gateway = Arc::new(RecordingGateway::new());
        let engine = SignalEngine::new(EngineConfig::default());
        let (service, tx) = RelayService::new(
            &config(symbols),
            engine,
            feed.clone(),
            gateway.clone(),
        );
        (service, tx, feed, gateway)
    }

    #[tokio::test]
    async fn test_poll_generates_signal_and_alerts() {
        let (mut service, _tx, feed, gateway) = service(&["BTCUSDT", "ETHUSDT"]);
        feed.set_ticker("BTCUSDT", "50000.00", "7.5", "5000.0");
        feed.set_ticker("ETHUSDT", "3000.00", "-3.2", "500.0"); // does not qualify

        service.poll_once().await;

        let sent = gateway.take();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("BUY signal BTCUSDT"));
    }

    #[tokio::test]
    async fn test_poll_tolerates_per_symbol_failure() {
        let (mut service, _tx, feed, gateway) = service(&["DOWNUSDT", "BTCUSDT"]);
        // DOWNUSDT has no ticker and errors; BTCUSDT still processes
        feed.set_ticker("BTCUSDT", "50000.00", "7.5", "5000.0");

        service.poll_once().await;

        let sent = gateway.take();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("BTCUSDT"));
    }

    #[tokio::test]
    async fn test_poll_fills_pending_order_and_notifies() {
        let (mut service, _tx, feed, gateway) = service(&["BTCUSDT"]);
        feed.set_ticker("BTCUSDT", "50000.00", "7.5", "5000.0");
        feed.set_price("BTCUSDT", "50250.0");

        // First cycle creates the signal; place an order off it
        service.poll_once().await;
        let (tx, rx) = oneshot::channel();
        service
            .handle_command(EngineCommand::PlaceOrder {
                side: Side::Buy,
                symbol: Symbol::new("BTCUSDT"),
                quantity: "0.001".parse().unwrap(),
                respond_to: tx,
            })
            .await;
        let order = rx.await.unwrap().unwrap();
        assert_eq!(order.price, Decimal::from(50000));
        gateway.take();

        // Second cycle fills it at 0.5% distance
        service.poll_once().await;
        let sent = gateway.take();
        assert!(sent.iter().any(|m| m.contains("filled @ 50250")));
        assert!(service.engine.pending_orders().is_empty());
    }

    #[tokio::test]
    async fn test_place_order_falls_back_to_market_price() {
        let (mut service, _tx, feed, _gateway) = service(&["BTCUSDT"]);
        feed.set_price("BTCUSDT", "49000.0");

        let (tx, rx) = oneshot::channel();
        service
            .handle_command(EngineCommand::PlaceOrder {
                side: Side::Sell,
                symbol: Symbol::new("BTCUSDT"),
                quantity: Decimal::ONE,
                respond_to: tx,
            })
            .await;
        let order = rx.await.unwrap().unwrap();
        assert_eq!(order.price, Decimal::from(49000));
        assert_eq!(order.side, Side::Sell);
        // Market-priced orders do not append to the signal list
        assert_eq!(service.engine.signal_count(), 0);
    }

    #[tokio::test]
    async fn test_dashboard_snapshot_round_trip() {
        let (mut service, _tx, feed, _gateway) = service(&["BTCUSDT"]);
        feed.set_ticker("BTCUSDT", "50000.00", "7.5", "5000.0");
        service.poll_once().await;

        let (tx, rx) = oneshot::channel();
        service
            .handle_command(EngineCommand::Dashboard { respond_to: tx })
            .await;
        let dashboard = rx.await.unwrap();
        assert_eq!(dashboard.signals.len(), 1);
        assert!(dashboard.orders.is_empty());
    }

    #[tokio::test]
    async fn test_run_loop_serves_chat_dispatch() {
        let (service, tx, feed, gateway) = service(&[]);
        feed.set_price("BTCUSDT", "50123.0");
        let handle = tokio::spawn(service.run());

        crate::chat::dispatch("!price BTCUSDT", "alex", &tx, gateway.as_ref())
            .await
            .unwrap();
        let sent = gateway.take();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("BTCUSDT: 50123"));

        drop(tx);
        handle.await.unwrap();
    }
}

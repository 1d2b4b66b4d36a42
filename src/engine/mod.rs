//! Signal & order engine.
//!
//! Classifies 24h ticker snapshots into trading signals, tracks pseudo-orders
//! through a fill/cancel lifecycle, and answers time-windowed queries. The
//! engine owns its signal and order lists outright; orders are addressed by
//! id and mutated only through [`SignalEngine::simulate_fill`], so a single
//! task can drive it without locks.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::core::{
    EngineConfig, Error, OrderStatus, PseudoOrder, Result, Side, Signal, Symbol, TickerSnapshot,
};

/// Stateful signal/order simulation engine.
pub struct SignalEngine {
    config: EngineConfig,
    signals: Vec<Signal>,
    orders: Vec<PseudoOrder>,
    order_seq: u64,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            signals: Vec::new(),
            orders: Vec::new(),
            order_seq: 0,
        }
    }

    /// Whether a snapshot meets the signal criteria: |24h change| above the
    /// change threshold AND volume above the volume floor.
    ///
    /// Pure. Missing or unparseable numeric fields fail closed.
    pub fn qualifies(&self, ticker: &TickerSnapshot) -> bool {
        let (Ok(change), Ok(volume)) = (
            ticker.price_change_percent.parse::<Decimal>(),
            ticker.volume.parse::<Decimal>(),
        ) else {
            return false;
        };
        change.abs() > self.config.min_change_percent && volume > self.config.min_volume
    }

    /// Generate a signal from a ticker snapshot, appending it to the signal
    /// list. Returns `None` exactly when the snapshot does not qualify.
    ///
    /// No deduplication: repeated qualifying snapshots for the same symbol
    /// each produce a fresh entry.
    pub fn generate_signal(&mut self, ticker: &TickerSnapshot) -> Option<Signal> {
        self.generate_signal_at(ticker, Utc::now())
    }

    pub fn generate_signal_at(
        &mut self,
        ticker: &TickerSnapshot,
        now: DateTime<Utc>,
    ) -> Option<Signal> {
        if !self.qualifies(ticker) {
            return None;
        }
        let change: Decimal = ticker.price_change_percent.parse().ok()?;
        let volume: Decimal = ticker.volume.parse().ok()?;
        let price: Decimal = ticker.last_price.parse().ok()?;

        let side = if change > Decimal::ZERO {
            Side::Buy
        } else {
            Side::Sell
        };
        // Linear in |change|, saturating at 10%
        let confidence = (change.abs() / Decimal::TEN).min(Decimal::ONE);

        let signal = Signal {
            symbol: Symbol::new(ticker.symbol.as_str()),
            side,
            price,
            change_percent: change,
            volume,
            created_at: now,
            confidence,
        };
        debug!(symbol = %signal.symbol, side = %side, confidence = %confidence, "signal generated");
        self.signals.push(signal.clone());
        Some(signal)
    }

    /// Create a pseudo-order priced off a signal and append it to the order
    /// list. Quantity sanity (positive, numeric) is the caller's job.
    pub fn create_order(&mut self, signal: &Signal, quantity: Decimal) -> PseudoOrder {
        self.create_order_at(signal, quantity, Utc::now())
    }

    pub fn create_order_at(
        &mut self,
        signal: &Signal,
        quantity: Decimal,
        now: DateTime<Utc>,
    ) -> PseudoOrder {
        // The 1-indexed counter only ever grows, so ids stay unique even for
        // same-symbol orders created within the same second.
        self.order_seq += 1;
        let id = format!("ORDER_{}_{}_{}", self.order_seq, signal.symbol, now.timestamp());

        let order = PseudoOrder {
            id,
            symbol: signal.symbol.clone(),
            side: signal.side,
            quantity,
            price: signal.price,
            created_at: now,
            status: OrderStatus::Pending,
            fill_price: None,
            fill_time: None,
        };
        debug!(id = %order.id, side = %order.side, price = %order.price, "pseudo-order created");
        self.orders.push(order.clone());
        order
    }

    /// Evaluate a pending order against a fresh market price. Returns whether
    /// a fill occurred on this call.
    ///
    /// Fills when the market is within the fill tolerance of the order price;
    /// otherwise cancels the order once it is older than the expiry window.
    /// The tolerance check runs first on every call, so a stale order can
    /// still fill if price reverts in the same evaluation.
    pub fn simulate_fill(&mut self, order_id: &str, market_price: Decimal) -> Result<bool> {
        self.simulate_fill_at(order_id, market_price, Utc::now())
    }

    pub fn simulate_fill_at(
        &mut self,
        order_id: &str,
        market_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(order) = self.orders.iter_mut().find(|o| o.id == order_id) else {
            return Err(Error::InvalidState(format!("unknown order id {order_id}")));
        };

        // Filled and Cancelled are terminal
        if order.status != OrderStatus::Pending {
            return Ok(false);
        }
        if order.price.is_zero() {
            return Err(Error::ZeroPrice(order.id.clone()));
        }

        let diff_percent = (market_price - order.price).abs() / order.price * Decimal::ONE_HUNDRED;
        if diff_percent <= self.config.fill_tolerance_percent {
            order.status = OrderStatus::Filled;
            order.fill_price = Some(market_price);
            order.fill_time = Some(now);
            debug!(id = %order.id, fill_price = %market_price, "order filled");
            return Ok(true);
        }

        if now - order.created_at > Duration::minutes(self.config.order_expiry_minutes) {
            order.status = OrderStatus::Cancelled;
            debug!(id = %order.id, "order expired, cancelled");
        }
        Ok(false)
    }

    /// Signals newer than `max_age_minutes`, in insertion (chronological)
    /// order. Non-destructive: nothing is pruned from the underlying list.
    pub fn active_signals(&self) -> Vec<Signal> {
        self.active_signals_at(self.config.signal_window_minutes, Utc::now())
    }

    pub fn active_signals_at(&self, max_age_minutes: i64, now: DateTime<Utc>) -> Vec<Signal> {
        let cutoff = now - Duration::minutes(max_age_minutes);
        self.signals
            .iter()
            .filter(|s| s.created_at > cutoff)
            .cloned()
            .collect()
    }

    /// Most recent active signal for a symbol and side, if any.
    pub fn latest_active_signal(&self, symbol: &Symbol, side: Side) -> Option<Signal> {
        self.active_signals_at(self.config.signal_window_minutes, Utc::now())
            .into_iter()
            .rev()
            .find(|s| &s.symbol == symbol && s.side == side)
    }

    /// Orders still pending, in creation order. Non-destructive.
    pub fn pending_orders(&self) -> Vec<PseudoOrder> {
        self.orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .cloned()
            .collect()
    }

    /// Look up any order by id.
    pub fn order(&self, id: &str) -> Option<&PseudoOrder> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

//! Outbound message templates

use rust_decimal::Decimal;
use std::fmt::Write;

use crate::core::{OrderStatus, PseudoOrder, Side, Signal, Symbol};

/// Dashboard caps: most recent entries win.
pub const MAX_DASHBOARD_SIGNALS: usize = 5;
pub const MAX_DASHBOARD_ORDERS: usize = 3;

pub fn greeting(name: &str) -> String {
    format!(
        "🤖 Hello {name}!\n\nCommands:\n!price <SYMBOL>\n!order <BUY|SELL> <SYMBOL> <QTY>\n!dashboard"
    )
}

pub fn thanks_reply(name: &str) -> String {
    format!("Thanks for the thumbs up, {name}!")
}

pub fn price_reply(symbol: &Symbol, price: Decimal) -> String {
    format!("📊 {symbol}: {price}")
}

pub fn error_reply(message: &str) -> String {
    format!("⚠️ {message}")
}

fn side_marker(side: Side) -> &'static str {
    match side {
        Side::Buy => "🟢",
        Side::Sell => "🔴",
    }
}

fn confidence_percent(signal: &Signal) -> Decimal {
    (signal.confidence * Decimal::ONE_HUNDRED).normalize()
}

pub fn signal_alert(signal: &Signal) -> String {
    format!(
        "{} {} signal {} @ {} (24h {}%, confidence {}%)",
        side_marker(signal.side),
        signal.side,
        signal.symbol,
        signal.price,
        signal.change_percent,
        confidence_percent(signal),
    )
}

pub fn order_placed(order: &PseudoOrder) -> String {
    format!(
        "⏳ Pseudo-order {}: {} {} {} @ {}",
        order.id, order.side, order.quantity, order.symbol, order.price
    )
}

pub fn order_filled(order: &PseudoOrder) -> String {
    let fill = order
        .fill_price
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!("✅ Order {} filled @ {}", order.id, fill)
}

pub fn order_cancelled(order: &PseudoOrder) -> String {
    format!("❌ Order {} cancelled (expired unfilled)", order.id)
}

fn status_marker(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "⏳",
        OrderStatus::Filled => "✅",
        OrderStatus::Cancelled => "❌",
    }
}

/// Dashboard summary: newest entries first, capped at
/// [`MAX_DASHBOARD_SIGNALS`] signals and [`MAX_DASHBOARD_ORDERS`] orders.
pub fn dashboard(signals: &[Signal], orders: &[PseudoOrder]) -> String {
    let mut out = String::from("📊 Dashboard\n");

    out.push_str("Active signals:\n");
    if signals.is_empty() {
        out.push_str("  (none)\n");
    }
    for signal in signals.iter().rev().take(MAX_DASHBOARD_SIGNALS) {
        let _ = writeln!(
            out,
            "  {} {} {} @ {} (confidence {}%)",
            side_marker(signal.side),
            signal.side,
            signal.symbol,
            signal.price,
            confidence_percent(signal),
        );
    }

    out.push_str("Pending orders:\n");
    if orders.is_empty() {
        out.push_str("  (none)\n");
    }
    for order in orders.iter().rev().take(MAX_DASHBOARD_ORDERS) {
        let _ = writeln!(
            out,
            "  {} {} {} {} @ {}",
            status_marker(order.status),
            order.side,
            order.quantity,
            order.symbol,
            order.price,
        );
    }
    out
}

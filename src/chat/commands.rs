//! Chat command grammar
//!
//! Commands are bang-prefixed, whitespace-separated text. Anything without
//! the prefix is ordinary chatter and parses to `None`; a bad argument list
//! is an `Error::Command` the caller turns into a formatted reply.

use rust_decimal::Decimal;

use crate::core::{Error, Result, Side, Symbol};

/// A parsed user intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Hello,
    Price { symbol: Symbol },
    PlaceOrder { side: Side, symbol: Symbol, quantity: Decimal },
    Dashboard,
}

pub fn parse(input: &str) -> Result<Option<Command>> {
    let trimmed = input.trim();
    if !trimmed.starts_with('!') {
        return Ok(None);
    }

    let mut parts = trimmed.split_whitespace();
    let head = parts.next().unwrap_or_default();
    let command = match head {
        "!hello" => Command::Hello,
        "!price" => {
            let symbol = parts
                .next()
                .ok_or_else(|| Error::Command("usage: !price <SYMBOL>".to_string()))?;
            Command::Price { symbol: Symbol::new(symbol) }
        }
        "!order" => {
            let usage = || Error::Command("usage: !order <BUY|SELL> <SYMBOL> <QTY>".to_string());
            let side: Side = parts.next().ok_or_else(usage)?.parse()?;
            let symbol = Symbol::new(parts.next().ok_or_else(usage)?);
            let raw_qty = parts.next().ok_or_else(usage)?;
            let quantity: Decimal = raw_qty
                .parse()
                .map_err(|_| Error::Command(format!("quantity must be a number, got '{raw_qty}'")))?;
            if quantity <= Decimal::ZERO {
                return Err(Error::Command(format!(
                    "quantity must be positive, got '{raw_qty}'"
                )));
            }
            Command::PlaceOrder { side, symbol, quantity }
        }
        "!dashboard" => Command::Dashboard,
        other => return Err(Error::Command(format!("unknown command '{other}'"))),
    };

    if parts.next().is_some() {
        return Err(Error::Command(format!("too many arguments for '{head}'")));
    }
    Ok(Some(command))
}

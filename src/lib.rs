//! market-relay - Core Library
//! Relays exchange market data into a group chat and simulates signal-driven
//! pseudo-orders in memory.

// Public modules
pub mod chat;
pub mod core;
pub mod engine;
pub mod feeds;
pub mod service;

// Re-exports
pub use crate::core::{Config, Error, Result};

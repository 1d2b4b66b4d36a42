//! Core module - Common types, configuration, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, EngineConfig, MarketConfig};
pub use error::{Error, Result};
pub use types::*;

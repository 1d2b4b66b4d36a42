//! Error handling - hierarchical errors for the relay

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// market-relay error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Exchange API errors (bad payloads, rejected symbols)
    #[error("Exchange error: {0}")]
    Exchange(String),

    /// Malformed chat command arguments
    #[error("Command error: {0}")]
    Command(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid state (unknown order ids and the like)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Order carries a zero reference price; fill distance is undefined
    #[error("Zero price on order {0}")]
    ZeroPrice(String),

    /// A channel peer went away
    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

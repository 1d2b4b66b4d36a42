//! Chat surface: command parsing, rendering, and outbound gateway.
//!
//! The chat platform itself is an external collaborator. Outbound traffic
//! goes through [`ChatGateway`]; inbound messages arrive as text lines (and
//! reaction events) and are dispatched here against the engine's command
//! channel.

pub mod commands;
pub mod render;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::core::{Error, Result};
use crate::service::EngineCommand;

pub use commands::Command;

/// Outbound message sink - implemented by platform adapters
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Gateway stand-in that mirrors outbound messages to the log.
/// Used when no platform adapter is wired up.
pub struct LogGateway;

#[async_trait]
impl ChatGateway for LogGateway {
    async fn send(&self, text: &str) -> Result<()> {
        info!(target: "chat", "{text}");
        Ok(())
    }
}

fn engine_gone() -> Error {
    Error::ChannelClosed("engine command channel".to_string())
}

/// Handle an inbound reaction event. Only the thumbs-up gets a reply;
/// everything else is ignored.
pub async fn dispatch_reaction(
    emoji: &str,
    author: &str,
    gateway: &dyn ChatGateway,
) -> Result<()> {
    if emoji == "👍" {
        return gateway.send(&render::thanks_reply(author)).await;
    }
    Ok(())
}

/// Handle one inbound chat line: parse it, run the intent against the
/// engine task, and reply through the gateway.
///
/// Malformed commands become error replies and never reach the engine.
pub async fn dispatch(
    line: &str,
    author: &str,
    engine_tx: &mpsc::Sender<EngineCommand>,
    gateway: &dyn ChatGateway,
) -> Result<()> {
    let command = match commands::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(()),
        Err(Error::Command(message)) => {
            return gateway.send(&render::error_reply(&message)).await;
        }
        Err(e) => return Err(e),
    };

    match command {
        Command::Hello => gateway.send(&render::greeting(author)).await,
        Command::Price { symbol } => {
            let (tx, rx) = oneshot::channel();
            engine_tx
                .send(EngineCommand::Price { symbol: symbol.clone(), respond_to: tx })
                .await
                .map_err(|_| engine_gone())?;
            match rx.await.map_err(|_| engine_gone())? {
                Ok(price) => gateway.send(&render::price_reply(&symbol, price)).await,
                Err(e) => gateway.send(&render::error_reply(&e.to_string())).await,
            }
        }
        Command::PlaceOrder { side, symbol, quantity } => {
            let (tx, rx) = oneshot::channel();
            engine_tx
                .send(EngineCommand::PlaceOrder { side, symbol, quantity, respond_to: tx })
                .await
                .map_err(|_| engine_gone())?;
            match rx.await.map_err(|_| engine_gone())? {
                Ok(order) => gateway.send(&render::order_placed(&order)).await,
                Err(e) => gateway.send(&render::error_reply(&e.to_string())).await,
            }
        }
        Command::Dashboard => {
            let (tx, rx) = oneshot::channel();
            engine_tx
                .send(EngineCommand::Dashboard { respond_to: tx })
                .await
                .map_err(|_| engine_gone())?;
            let dashboard = rx.await.map_err(|_| engine_gone())?;
            gateway
                .send(&render::dashboard(&dashboard.signals, &dashboard.orders))
                .await
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingGateway;
    use super::*;

    #[tokio::test]
    async fn test_dispatch_ignores_plain_chatter() {
        let (tx, mut rx) = mpsc::channel(4);
        let gateway = RecordingGateway::new();
        dispatch("just vibing", "alex", &tx, &gateway).await.unwrap();
        assert!(gateway.take().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_replies_to_hello_without_engine() {
        let (tx, mut rx) = mpsc::channel(4);
        let gateway = RecordingGateway::new();
        dispatch("!hello", "alex", &tx, &gateway).await.unwrap();
        let sent = gateway.take();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Hello alex"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_thumbs_up_reaction_gets_thanked() {
        let gateway = RecordingGateway::new();
        dispatch_reaction("👍", "alex", &gateway).await.unwrap();
        let sent = gateway.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], "Thanks for the thumbs up, alex!");
    }

    #[tokio::test]
    async fn test_other_reactions_are_ignored() {
        let gateway = RecordingGateway::new();
        dispatch_reaction("🚀", "alex", &gateway).await.unwrap();
        assert!(gateway.take().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_reports_bad_arguments() {
        let (tx, mut rx) = mpsc::channel(4);
        let gateway = RecordingGateway::new();
        dispatch("!order buy BTCUSDT -1", "alex", &tx, &gateway).await.unwrap();
        let sent = gateway.take();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("⚠️"));
        // The engine never sees invalid input
        assert!(rx.try_recv().is_err());
    }
}

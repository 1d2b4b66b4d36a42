use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use market_relay::chat::{self, ChatGateway, LogGateway};
use market_relay::core::Config;
use market_relay::engine::SignalEngine;
use market_relay::feeds::{BinanceFeed, MarketFeed};
use market_relay::service::RelayService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.app.log_filter.clone()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    tracing::info!(
        symbols = ?config.market.symbols,
        testnet = config.market.testnet,
        interval_secs = config.poll.interval_secs,
        "🤖 market-relay starting"
    );
    if let Some(chat_config) = &config.chat {
        // The platform adapter is external; outbound traffic is mirrored to
        // the log until one is wired in.
        tracing::info!(channel = %chat_config.channel, "chat gateway configured");
    }

    let feed: Arc<dyn MarketFeed> = Arc::new(BinanceFeed::new(&config.market)?);
    let gateway: Arc<dyn ChatGateway> = Arc::new(LogGateway);
    let engine = SignalEngine::new(config.engine.clone());

    let (service, engine_tx) = RelayService::new(&config, engine, feed, gateway.clone());
    let service_handle = tokio::spawn(service.run());

    // Local console chat: each stdin line is treated as an inbound message.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        chat::dispatch(&line, "operator", &engine_tx, gateway.as_ref()).await?;
    }

    drop(engine_tx);
    service_handle.await?;
    Ok(())
}

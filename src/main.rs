// =============================================================================
// Meridian Bot — Demo Entry Point
// =============================================================================
//
// Wires a minimal logging algorithm into the runtime. Real deployments build
// their own binary against the library and supply their own `Algorithm`.
// =============================================================================

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use meridian_bot::{AlgoContext, Algorithm, BotConfig, TradingBot, TriggerCause};

/// Demo strategy: log a one-line summary of the state it can see.
struct LoggingAlgorithm;

#[async_trait]
impl Algorithm for LoggingAlgorithm {
    async fn run(&self, ctx: AlgoContext, cause: TriggerCause) -> Result<()> {
        match &cause {
            TriggerCause::Feed(topic) => {
                if let Some(book) = ctx.market.book(topic) {
                    info!(
                        topic = %topic,
                        levels = book.len(),
                        low = book.lowest().map(|l| l.price),
                        high = book.highest().map(|l| l.price),
                        "book update"
                    );
                } else if let Some(trades) = ctx.market.trades(topic) {
                    info!(
                        topic = %topic,
                        trades = trades.len(),
                        last_price = trades.last().map(|t| t.price),
                        "trade update"
                    );
                } else if let Some(candles) = ctx.market.candles(topic) {
                    info!(
                        topic = %topic,
                        candles = candles.len(),
                        last_close = candles.last().map(|c| c.close),
                        "candle update"
                    );
                }
            }
            TriggerCause::Manual(payload) => {
                info!(payload = %payload, "manual trigger");
            }
        }

        info!(open_orders = ctx.orders.len(), "order state");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Meridian Trading Bot — Starting Up               ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = BotConfig::load("bot_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        BotConfig::default()
    });

    // Override credentials from env if available.
    if let Ok(key) = std::env::var("MERIDIAN_API_KEY") {
        config.api_key = key;
    }
    if let Ok(secret) = std::env::var("MERIDIAN_API_SECRET") {
        config.api_secret = secret;
    }
    if config.data_feed_topics.is_empty() {
        config.data_feed_topics = vec![
            "book:BTC/USD".into(),
            "trades:BTC/USD".into(),
            "candles:BTC/USD:1m".into(),
        ];
        config.trigger_topics = vec!["trades:BTC/USD".into()];
    }

    info!(
        topics = ?config.data_feed_topics,
        trigger_topics = ?config.trigger_topics,
        remote_triggering = config.allow_remote_triggering,
        "Configured data feed"
    );

    // ── 2. Build & start the bot ─────────────────────────────────────────
    let bot = TradingBot::new(config, Arc::new(LoggingAlgorithm));
    bot.start().await?;

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 3. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");
    bot.shutdown();

    info!("Meridian bot shut down complete.");
    Ok(())
}

// =============================================================================
// TradingBot — wires the stores, ingestion loops, and dispatcher together
// =============================================================================
//
// `start()` authenticates, then brings up one task per ingestion loop (order
// events, data feed, and optionally the remote trigger gateway). Loops that
// return with an error are restarted after a short pause; loops that return
// cleanly (shutdown) are not.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};

use crate::algo::{AlgoContext, Algorithm};
use crate::config::BotConfig;
use crate::dispatch::Dispatcher;
use crate::feed;
use crate::market_data::MarketDataStore;
use crate::orders::{self, OrderManagerClient, OrderTracker};
use crate::trigger;

/// Pause between reconnect attempts for a failed ingestion loop.
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// The bot runtime: market data view, order state view, and algorithm
/// dispatch for one account.
pub struct TradingBot {
    config: BotConfig,
    client: Arc<OrderManagerClient>,
    store: Arc<MarketDataStore>,
    orders: Arc<OrderTracker>,
    dispatcher: Arc<Dispatcher>,
    shutdown: watch::Sender<bool>,
}

impl TradingBot {
    pub fn new(config: BotConfig, algorithm: Arc<dyn Algorithm>) -> Self {
        let client = Arc::new(OrderManagerClient::new(
            config.api_key.clone(),
            config.api_secret.clone(),
            config.rest_base_url.clone(),
        ));
        let store = Arc::new(MarketDataStore::new(config.candle_window));
        let orders = Arc::new(OrderTracker::new());

        let ctx = AlgoContext {
            market: Arc::clone(&store),
            orders: Arc::clone(&orders),
            client: Arc::clone(&client),
        };
        let dispatcher = Arc::new(Dispatcher::new(algorithm, ctx, config.algorithm_timeout()));

        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            client,
            store,
            orders,
            dispatcher,
            shutdown,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn market(&self) -> &Arc<MarketDataStore> {
        &self.store
    }

    pub fn orders(&self) -> &Arc<OrderTracker> {
        &self.orders
    }

    pub fn client(&self) -> &Arc<OrderManagerClient> {
        &self.client
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Authenticate and bring up all ingestion loops. Returns once the loops
    /// are spawned; they run until [`TradingBot::shutdown`] is called.
    pub async fn start(&self) -> Result<()> {
        let endpoints = self
            .client
            .authenticate()
            .await
            .context("authentication failed")?;

        info!(
            data_feed = %endpoints.data_feed_sub_url,
            order_events = %endpoints.order_events_sub_url,
            "authenticated, stream endpoints received"
        );

        // ── Order events loop ───────────────────────────────────────────
        {
            let sub_url = endpoints.order_events_sub_url.clone();
            let api_key = self.config.api_key.clone();
            let tracker = Arc::clone(&self.orders);
            let mut rx = self.shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    match orders::run_order_loop(&sub_url, &api_key, &tracker, &mut rx).await {
                        Ok(()) => break,
                        Err(e) => {
                            error!(error = %e, "order events loop error, reconnecting in 5s");
                        }
                    }
                    if *rx.borrow() {
                        break;
                    }
                    tokio::time::sleep(RECONNECT_PAUSE).await;
                }
            });
        }

        // Order stream first, then the data feed.
        tokio::time::sleep(Duration::from_secs(1)).await;

        // ── Data feed loop ──────────────────────────────────────────────
        {
            let sub_url = endpoints.data_feed_sub_url.clone();
            let req_url = endpoints.data_feed_req_url.clone();
            let topics = self.config.data_feed_topics.clone();
            let trigger_topics = self.config.trigger_topic_set();
            let store = Arc::clone(&self.store);
            let dispatcher = Arc::clone(&self.dispatcher);
            let mut rx = self.shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    match feed::run_feed_loop(
                        &sub_url,
                        &req_url,
                        &topics,
                        &trigger_topics,
                        &store,
                        &dispatcher,
                        &mut rx,
                    )
                    .await
                    {
                        Ok(()) => break,
                        Err(e) => {
                            error!(error = %e, "data feed loop error, reconnecting in 5s");
                        }
                    }
                    if *rx.borrow() {
                        break;
                    }
                    tokio::time::sleep(RECONNECT_PAUSE).await;
                }
            });
        }

        // ── Remote trigger gateway (optional) ───────────────────────────
        if self.config.allow_remote_triggering {
            let bind = self.config.remote_trigger_bind.clone();
            let dispatcher = Arc::clone(&self.dispatcher);
            let mut rx = self.shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    match trigger::run_trigger_gateway(&bind, &dispatcher, &mut rx).await {
                        Ok(()) => break,
                        Err(e) => {
                            error!(error = %e, "remote trigger gateway error, rebinding in 5s");
                        }
                    }
                    if *rx.borrow() {
                        break;
                    }
                    tokio::time::sleep(RECONNECT_PAUSE).await;
                }
            });
        }

        info!("trading bot started");
        Ok(())
    }

    /// Signal all loops to stop after their current message.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TriggerCause;
    use async_trait::async_trait;

    struct NoopAlgorithm;

    #[async_trait]
    impl Algorithm for NoopAlgorithm {
        async fn run(&self, _ctx: AlgoContext, _cause: TriggerCause) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn construction_wires_per_instance_state() {
        let mut config = BotConfig::default();
        config.candle_window = 42;
        let bot = TradingBot::new(config, Arc::new(NoopAlgorithm));

        assert!(bot.market().is_empty());
        assert!(bot.orders().is_empty());
        assert!(!bot.dispatcher().gate().is_running());

        // A second bot gets its own stores, not shared ones.
        let other = TradingBot::new(BotConfig::default(), Arc::new(NoopAlgorithm));
        other.orders().apply(
            serde_json::from_str(r#"{"id":1,"status":"NEW"}"#).unwrap(),
        );
        assert!(bot.orders().is_empty());
        assert_eq!(other.orders().len(), 1);
    }

    #[test]
    fn shutdown_flips_the_signal() {
        let bot = TradingBot::new(BotConfig::default(), Arc::new(NoopAlgorithm));
        let rx = bot.shutdown.subscribe();
        assert!(!*rx.borrow());
        bot.shutdown();
        assert!(*rx.borrow());
    }
}

// =============================================================================
// Data Feed Ingestion Loop — snapshot via REQ-REP, then stream via SUB
// =============================================================================
//
// Lifecycle: connect both sockets, fetch a full snapshot per subscribed topic
// and apply it, then subscribe and stream incrementals. Snapshots land before
// any incremental so updates never arrive without a baseline.
//
// Returns `Ok(())` on clean shutdown and `Err` on connection loss so that the
// supervisor (bot.rs) can reconnect.
// =============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};
use zeromq::{Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::dispatch::Dispatcher;
use crate::feed::codec;
use crate::market_data::MarketDataStore;
use crate::types::TriggerCause;

/// Run the market data ingestion loop until shutdown or connection loss.
pub async fn run_feed_loop(
    sub_url: &str,
    req_url: &str,
    topics: &[String],
    trigger_topics: &HashSet<String>,
    store: &Arc<MarketDataStore>,
    dispatcher: &Arc<Dispatcher>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<()> {
    // ── Connecting ──────────────────────────────────────────────────────
    let mut sub = zeromq::SubSocket::new();
    sub.connect(sub_url)
        .await
        .with_context(|| format!("failed to connect data feed SUB socket to {sub_url}"))?;

    let mut req = zeromq::ReqSocket::new();
    req.connect(req_url)
        .await
        .with_context(|| format!("failed to connect data feed REQ socket to {req_url}"))?;

    info!(sub_url = %sub_url, req_url = %req_url, "data feed connected");

    // ── Snapshotting ────────────────────────────────────────────────────
    for topic in topics {
        req.send(ZmqMessage::from(topic.clone()))
            .await
            .with_context(|| format!("snapshot request for {topic} failed"))?;
        let reply = req
            .recv()
            .await
            .with_context(|| format!("snapshot reply for {topic} failed"))?;

        let Some(body) = reply.get(1) else {
            warn!(topic = %topic, "snapshot reply missing body frame");
            continue;
        };

        match codec::decode(topic, body.as_ref()) {
            Ok(Some(update)) => {
                store.apply(topic, update);
                info!(topic = %topic, "snapshot loaded");
            }
            Ok(None) => warn!(topic = %topic, "snapshot for topic with unknown family"),
            Err(e) => warn!(topic = %topic, error = %e, "failed to decode snapshot"),
        }
    }

    for topic in topics {
        sub.subscribe(topic)
            .await
            .with_context(|| format!("failed to subscribe to {topic}"))?;
    }

    // ── Streaming ───────────────────────────────────────────────────────
    info!(topics = topics.len(), "data feed streaming");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("data feed loop shutting down");
                    return Ok(());
                }
            }
            msg = sub.recv() => {
                let msg = msg.context("data feed SUB receive failed")?;
                handle_message(&msg, trigger_topics, store, dispatcher);
            }
        }
    }
}

/// Decode and apply one SUB message, then run the trigger check. A malformed
/// message is dropped here; it never terminates the stream.
fn handle_message(
    msg: &ZmqMessage,
    trigger_topics: &HashSet<String>,
    store: &Arc<MarketDataStore>,
    dispatcher: &Arc<Dispatcher>,
) {
    let Some(topic) = msg
        .get(0)
        .and_then(|frame| std::str::from_utf8(frame.as_ref()).ok())
        .map(str::to_string)
    else {
        warn!("dropping feed message with unreadable topic frame");
        return;
    };

    let Some(body) = msg.get(1) else {
        warn!(topic = %topic, "dropping feed message without body frame");
        return;
    };

    match codec::decode(&topic, body.as_ref()) {
        Ok(Some(update)) => store.apply(&topic, update),
        // Unknown family: nothing to store, but the topic may still trigger.
        Ok(None) => {}
        Err(e) => {
            warn!(topic = %topic, error = %e, "dropping malformed feed message");
            return;
        }
    }

    if trigger_topics.contains(&topic) {
        dispatcher.trigger_best_effort(TriggerCause::Feed(topic));
    }
}

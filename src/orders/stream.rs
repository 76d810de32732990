// =============================================================================
// Order Events Ingestion Loop — SUB stream scoped to the account's API key
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use zeromq::{Socket, SocketRecv};

use crate::orders::tracker::{OrderEvent, OrderTracker};

/// Run the order events ingestion loop until shutdown or connection loss.
///
/// Subscribes to the single topic `orders:<api_key>` and merges each event
/// into `tracker`. Malformed messages are dropped and the loop continues.
pub async fn run_order_loop(
    sub_url: &str,
    api_key: &str,
    tracker: &Arc<OrderTracker>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<()> {
    let mut sub = zeromq::SubSocket::new();
    sub.connect(sub_url)
        .await
        .with_context(|| format!("failed to connect order events SUB socket to {sub_url}"))?;

    let topic = format!("orders:{api_key}");
    sub.subscribe(&topic)
        .await
        .context("failed to subscribe to order events topic")?;

    info!(topic = %topic, "order events stream connected");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("order events loop shutting down");
                    return Ok(());
                }
            }
            msg = sub.recv() => {
                let msg = msg.context("order events SUB receive failed")?;

                let Some(body) = msg.get(1) else {
                    warn!("dropping order event without body frame");
                    continue;
                };

                match serde_json::from_slice::<OrderEvent>(body.as_ref()) {
                    Ok(event) => {
                        debug!(order_id = event.id, "order update applied");
                        tracker.apply(event);
                    }
                    Err(e) => warn!(error = %e, "dropping malformed order event"),
                }
            }
        }
    }
}

// =============================================================================
// Algorithm contract — the user-supplied trading logic
// =============================================================================

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::market_data::MarketDataStore;
use crate::orders::{OrderManagerClient, OrderTracker};
use crate::types::TriggerCause;

/// Handles passed to the algorithm on every run: the market data view, the
/// order state view, and the REST client for placing orders.
#[derive(Clone)]
pub struct AlgoContext {
    pub market: Arc<MarketDataStore>,
    pub orders: Arc<OrderTracker>,
    pub client: Arc<OrderManagerClient>,
}

/// User-supplied trading logic, invoked once per admitted run.
///
/// A run receives a fresh context and the cause of its admission. Errors are
/// contained to the run: they are logged and never reach the ingestion loops.
#[async_trait]
pub trait Algorithm: Send + Sync + 'static {
    async fn run(&self, ctx: AlgoContext, cause: TriggerCause) -> Result<()>;
}

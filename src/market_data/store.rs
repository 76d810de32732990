// =============================================================================
// Market Data Store — per-topic state with family-specific merge rules
// =============================================================================
//
// Written exclusively by the feed ingestion loop; read by algorithm tasks via
// copy-on-read snapshots, so readers never hold the lock while they work.
// =============================================================================

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::feed::codec::{FamilyRecord, FamilySnapshot, FeedUpdate};
use crate::market_data::book::OrderBook;
use crate::market_data::candles::{Candle, CandleSeries};
use crate::market_data::trades::{Trade, TradeTape};

/// State held for one topic, shaped by the topic's family.
#[derive(Debug, Clone)]
pub enum TopicState {
    Book(OrderBook),
    Trades(TradeTape),
    Candles(CandleSeries),
}

/// Per-topic market data state. Entries are created on the first snapshot for
/// a topic and live for the process lifetime.
pub struct MarketDataStore {
    topics: RwLock<HashMap<String, TopicState>>,
    candle_window: usize,
}

impl MarketDataStore {
    /// `candle_window` bounds every candle series kept by this store.
    pub fn new(candle_window: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            candle_window,
        }
    }

    /// Merge a decoded update into the state for `topic`.
    ///
    /// Snapshots replace the topic's state wholesale. Incremental updates
    /// merge against existing state and are a no-op when no baseline exists
    /// yet. Other topics are never touched.
    pub fn apply(&self, topic: &str, update: FeedUpdate) {
        match update {
            FeedUpdate::Empty => {}
            FeedUpdate::Snapshot(snapshot) => {
                let state = match snapshot {
                    FamilySnapshot::Book(levels) => {
                        TopicState::Book(OrderBook::from_snapshot(levels))
                    }
                    FamilySnapshot::Trades(trades) => {
                        TopicState::Trades(TradeTape::from_snapshot(trades))
                    }
                    FamilySnapshot::Candles(candles) => {
                        TopicState::Candles(CandleSeries::from_snapshot(candles, self.candle_window))
                    }
                };
                self.topics.write().insert(topic.to_string(), state);
                debug!(topic = %topic, "snapshot applied");
            }
            FeedUpdate::Incremental(record) => {
                let mut topics = self.topics.write();
                match (topics.get_mut(topic), record) {
                    (Some(TopicState::Book(book)), FamilyRecord::Book(level)) => {
                        book.apply_level(level);
                    }
                    (Some(TopicState::Trades(tape)), FamilyRecord::Trade(trade)) => {
                        tape.push(trade);
                    }
                    (Some(TopicState::Candles(series)), FamilyRecord::Candle(candle)) => {
                        series.apply(candle);
                    }
                    // No baseline for this topic yet, or a family mismatch.
                    _ => {}
                }
            }
        }
    }

    /// Copy of the order book for `topic`, if one has been established.
    pub fn book(&self, topic: &str) -> Option<OrderBook> {
        match self.topics.read().get(topic) {
            Some(TopicState::Book(book)) => Some(book.clone()),
            _ => None,
        }
    }

    /// Copy of the trade tape for `topic`, oldest-first.
    pub fn trades(&self, topic: &str) -> Option<Vec<Trade>> {
        match self.topics.read().get(topic) {
            Some(TopicState::Trades(tape)) => Some(tape.to_vec()),
            _ => None,
        }
    }

    /// Copy of the candle series for `topic`, oldest-first.
    pub fn candles(&self, topic: &str) -> Option<Vec<Candle>> {
        match self.topics.read().get(topic) {
            Some(TopicState::Candles(series)) => Some(series.to_vec()),
            _ => None,
        }
    }

    /// Topics with established state.
    pub fn topics(&self) -> Vec<String> {
        self.topics.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.topics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

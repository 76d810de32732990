// =============================================================================
// Order Book — per-topic price → level map
// =============================================================================

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A single price level as published by the data feed.
///
/// A level with `count == 0` is a removal marker on the wire and is never
/// stored. Fields beyond the core three are carried verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub count: i64,
    #[serde(default)]
    pub amount: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Order book state for a single topic: exactly one record per price.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    levels: BTreeMap<OrderedFloat<f64>, PriceLevel>,
}

impl OrderBook {
    /// Build a book from a full snapshot, replacing any prior state. When a
    /// snapshot repeats a price, the later record wins.
    pub fn from_snapshot(levels: Vec<PriceLevel>) -> Self {
        let mut book = Self::default();
        for level in levels {
            book.levels.insert(OrderedFloat(level.price), level);
        }
        book
    }

    /// Apply one incremental level. `count == 0` removes the entry at that
    /// price (no error if absent); anything else inserts or updates it.
    pub fn apply_level(&mut self, level: PriceLevel) {
        if level.count == 0 {
            self.levels.remove(&OrderedFloat(level.price));
        } else {
            self.levels.insert(OrderedFloat(level.price), level);
        }
    }

    /// Level stored at an exact price, if any.
    pub fn level_at(&self, price: f64) -> Option<&PriceLevel> {
        self.levels.get(&OrderedFloat(price))
    }

    /// Lowest-priced level in the book.
    pub fn lowest(&self) -> Option<&PriceLevel> {
        self.levels.values().next()
    }

    /// Highest-priced level in the book.
    pub fn highest(&self) -> Option<&PriceLevel> {
        self.levels.values().next_back()
    }

    /// All levels in ascending price order.
    pub fn levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.values()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

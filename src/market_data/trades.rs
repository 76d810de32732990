// =============================================================================
// Trade Tape — bounded ring buffer of recent trades per topic
// =============================================================================

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// A single trade record from the feed. Unknown fields ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub time: i64,
    pub price: f64,
    #[serde(default)]
    pub amount: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Ring buffer of trades in arrival order, capacity fixed at the length of
/// the last full snapshot. Appending at capacity evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct TradeTape {
    buf: VecDeque<Trade>,
    capacity: usize,
}

impl TradeTape {
    /// Build a tape from a full snapshot. The snapshot length becomes the
    /// tape's capacity.
    pub fn from_snapshot(trades: Vec<Trade>) -> Self {
        let capacity = trades.len();
        Self {
            buf: VecDeque::from(trades),
            capacity,
        }
    }

    /// Append one trade at the tail, evicting the oldest entry when full.
    pub fn push(&mut self, trade: Trade) {
        if self.capacity == 0 {
            return;
        }
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(trade);
    }

    /// Most recent trade, if any.
    pub fn latest(&self) -> Option<&Trade> {
        self.buf.back()
    }

    /// Trades oldest-first, as received.
    pub fn iter(&self) -> impl Iterator<Item = &Trade> {
        self.buf.iter()
    }

    pub fn to_vec(&self) -> Vec<Trade> {
        self.buf.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(id: i64, price: f64) -> Trade {
        Trade {
            id,
            time: id * 1_000,
            price,
            amount: 0.5,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn snapshot_fixes_capacity() {
        let tape = TradeTape::from_snapshot(vec![trade(1, 10.0), trade(2, 11.0), trade(3, 12.0)]);
        assert_eq!(tape.capacity(), 3);
        assert_eq!(tape.len(), 3);
    }

    #[test]
    fn push_at_capacity_evicts_oldest() {
        let mut tape =
            TradeTape::from_snapshot(vec![trade(1, 10.0), trade(2, 11.0), trade(3, 12.0)]);

        tape.push(trade(4, 13.0));
        assert_eq!(tape.len(), 3);

        let ids: Vec<i64> = tape.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(tape.latest().unwrap().id, 4);
    }

    #[test]
    fn ordering_is_arrival_order() {
        // Out-of-order ids are kept as received, never re-sorted.
        let mut tape = TradeTape::from_snapshot(vec![trade(5, 10.0), trade(2, 11.0)]);
        tape.push(trade(1, 12.0));

        let ids: Vec<i64> = tape.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn new_snapshot_resets_capacity() {
        let mut tape = TradeTape::from_snapshot(vec![trade(1, 10.0), trade(2, 11.0)]);
        tape.push(trade(3, 12.0));
        assert_eq!(tape.capacity(), 2);

        let tape = TradeTape::from_snapshot(vec![
            trade(10, 20.0),
            trade(11, 21.0),
            trade(12, 22.0),
            trade(13, 23.0),
        ]);
        assert_eq!(tape.capacity(), 4);
        assert_eq!(tape.len(), 4);
    }
}

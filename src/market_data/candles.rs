// =============================================================================
// Candle Series — bounded trailing window of OHLCV candles per topic
// =============================================================================

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// A single OHLCV candle keyed by its integer timestamp bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Candle {
    /// Field-wise overwrite from a newer candle for the same bucket. Extra
    /// fields are merged key-by-key, newer values winning.
    pub fn merge_from(&mut self, newer: Candle) {
        self.time = newer.time;
        self.open = newer.open;
        self.high = newer.high;
        self.low = newer.low;
        self.close = newer.close;
        self.volume = newer.volume;
        for (key, value) in newer.extra {
            self.extra.insert(key, value);
        }
    }
}

/// Outcome of applying a single incremental candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleOutcome {
    /// Strictly newer bucket: appended as the new trailing candle.
    Appended,
    /// Same bucket as the trailing candle: merged in place.
    Merged,
    /// Older bucket: dropped.
    Dropped,
}

/// Ordered candle series, newest last, at most one candle per bucket.
/// Bounded to a fixed trailing window with oldest-first eviction.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    buf: VecDeque<Candle>,
    window: usize,
}

impl CandleSeries {
    /// Build a series from a full snapshot, replacing any prior state. A
    /// snapshot longer than the window keeps only the newest `window` entries.
    pub fn from_snapshot(candles: Vec<Candle>, window: usize) -> Self {
        let mut buf = VecDeque::from(candles);
        while buf.len() > window {
            buf.pop_front();
        }
        Self { buf, window }
    }

    /// Apply one incremental candle against the trailing entry.
    pub fn apply(&mut self, candle: Candle) -> CandleOutcome {
        match self.buf.back_mut() {
            None => {
                self.buf.push_back(candle);
                self.trim();
                CandleOutcome::Appended
            }
            Some(last) if candle.time > last.time => {
                self.buf.push_back(candle);
                self.trim();
                CandleOutcome::Appended
            }
            Some(last) if candle.time == last.time => {
                last.merge_from(candle);
                CandleOutcome::Merged
            }
            Some(_) => CandleOutcome::Dropped,
        }
    }

    fn trim(&mut self) {
        while self.buf.len() > self.window {
            self.buf.pop_front();
        }
    }

    /// Trailing (newest) candle, if any.
    pub fn last(&self) -> Option<&Candle> {
        self.buf.back()
    }

    /// Candles oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.buf.iter()
    }

    pub fn to_vec(&self) -> Vec<Candle> {
        self.buf.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(time: i64, close: f64) -> Candle {
        Candle {
            time,
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 100.0,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn newer_bucket_appends() {
        let mut series = CandleSeries::from_snapshot(vec![candle(60, 10.0)], 5);
        assert_eq!(series.apply(candle(120, 11.0)), CandleOutcome::Appended);
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().time, 120);
    }

    #[test]
    fn window_evicts_oldest_first() {
        let mut series = CandleSeries::from_snapshot(vec![candle(0, 1.0)], 3);
        for i in 1..=4 {
            series.apply(candle(i * 60, 1.0 + i as f64));
        }

        assert_eq!(series.len(), 3);
        let times: Vec<i64> = series.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![120, 180, 240]);
    }

    #[test]
    fn equal_bucket_merges_without_growing() {
        let mut series = CandleSeries::from_snapshot(vec![candle(60, 10.0), candle(120, 11.0)], 5);

        let mut update = candle(120, 11.5);
        update
            .extra
            .insert("vwap".into(), serde_json::json!(11.2));

        assert_eq!(series.apply(update), CandleOutcome::Merged);
        assert_eq!(series.len(), 2);

        let last = series.last().unwrap();
        assert_eq!(last.close, 11.5);
        assert_eq!(last.extra.get("vwap").unwrap(), &serde_json::json!(11.2));
    }

    #[test]
    fn older_bucket_is_dropped() {
        let mut series = CandleSeries::from_snapshot(vec![candle(60, 10.0), candle(120, 11.0)], 5);
        assert_eq!(series.apply(candle(60, 99.0)), CandleOutcome::Dropped);
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 11.0);
    }

    #[test]
    fn snapshot_longer_than_window_keeps_newest() {
        let candles: Vec<Candle> = (0..10).map(|i| candle(i * 60, i as f64)).collect();
        let series = CandleSeries::from_snapshot(candles, 4);

        assert_eq!(series.len(), 4);
        assert_eq!(series.iter().next().unwrap().time, 360);
        assert_eq!(series.last().unwrap().time, 540);
    }

    #[test]
    fn apply_into_empty_series_appends() {
        let mut series = CandleSeries::from_snapshot(Vec::new(), 5);
        assert_eq!(series.apply(candle(60, 10.0)), CandleOutcome::Appended);
        assert_eq!(series.len(), 1);
    }
}

// =============================================================================
// Feed Codec — classify a topic payload as snapshot or incremental update
// =============================================================================
//
// Message bodies are JSON arrays of records. Array length decides the kind:
// more than one record is a full snapshot, exactly one is an incremental
// update, zero is an empty payload (logical no-op).
// =============================================================================

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::market_data::{Candle, PriceLevel, Trade};
use crate::types::TopicFamily;

/// A full snapshot payload, typed by family.
#[derive(Debug, Clone)]
pub enum FamilySnapshot {
    Book(Vec<PriceLevel>),
    Trades(Vec<Trade>),
    Candles(Vec<Candle>),
}

/// A single incremental record, typed by family.
#[derive(Debug, Clone)]
pub enum FamilyRecord {
    Book(PriceLevel),
    Trade(Trade),
    Candle(Candle),
}

/// A decoded feed payload for one topic.
#[derive(Debug, Clone)]
pub enum FeedUpdate {
    Snapshot(FamilySnapshot),
    Incremental(FamilyRecord),
    Empty,
}

enum Classified<T> {
    Empty,
    One(T),
    Many(Vec<T>),
}

fn classify<T: DeserializeOwned>(body: &[u8]) -> Result<Classified<T>> {
    let mut records: Vec<T> =
        serde_json::from_slice(body).context("payload is not a JSON array of records")?;
    Ok(match records.len() {
        0 => Classified::Empty,
        1 => Classified::One(records.remove(0)),
        _ => Classified::Many(records),
    })
}

/// Decode the message body for `topic`.
///
/// Returns `Ok(None)` when the topic belongs to no known family (the caller
/// treats this as a logical no-op). Malformed payloads are an error; the
/// ingestion loop drops the message and continues.
pub fn decode(topic: &str, body: &[u8]) -> Result<Option<FeedUpdate>> {
    let Some(family) = TopicFamily::of(topic) else {
        return Ok(None);
    };

    let update = match family {
        TopicFamily::Book => match classify::<PriceLevel>(body)? {
            Classified::Empty => FeedUpdate::Empty,
            Classified::One(level) => FeedUpdate::Incremental(FamilyRecord::Book(level)),
            Classified::Many(levels) => FeedUpdate::Snapshot(FamilySnapshot::Book(levels)),
        },
        TopicFamily::Trades => match classify::<Trade>(body)? {
            Classified::Empty => FeedUpdate::Empty,
            Classified::One(trade) => FeedUpdate::Incremental(FamilyRecord::Trade(trade)),
            Classified::Many(trades) => FeedUpdate::Snapshot(FamilySnapshot::Trades(trades)),
        },
        TopicFamily::Candles => match classify::<Candle>(body)? {
            Classified::Empty => FeedUpdate::Empty,
            Classified::One(candle) => FeedUpdate::Incremental(FamilyRecord::Candle(candle)),
            Classified::Many(candles) => FeedUpdate::Snapshot(FamilySnapshot::Candles(candles)),
        },
    };

    Ok(Some(update))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_record_book_payload_is_snapshot() {
        let body = br#"[{"price":100,"count":2},{"price":101,"count":1}]"#;
        match decode("book:BTC/USD", body).unwrap().unwrap() {
            FeedUpdate::Snapshot(FamilySnapshot::Book(levels)) => {
                assert_eq!(levels.len(), 2);
                assert_eq!(levels[0].price, 100.0);
            }
            other => panic!("expected book snapshot, got {other:?}"),
        }
    }

    #[test]
    fn single_record_is_incremental() {
        let body = br#"[{"price":100,"count":0}]"#;
        match decode("book:BTC/USD", body).unwrap().unwrap() {
            FeedUpdate::Incremental(FamilyRecord::Book(level)) => {
                assert_eq!(level.count, 0);
            }
            other => panic!("expected incremental book update, got {other:?}"),
        }
    }

    #[test]
    fn empty_array_is_empty_update() {
        assert!(matches!(
            decode("trades:BTC/USD", b"[]").unwrap().unwrap(),
            FeedUpdate::Empty
        ));
    }

    #[test]
    fn unknown_family_decodes_to_none() {
        assert!(decode("ticker:BTC/USD", b"[]").unwrap().is_none());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(decode("book:BTC/USD", b"not json").is_err());
        assert!(decode("book:BTC/USD", br#"{"price":100}"#).is_err());
        // A record missing required fields is malformed too.
        assert!(decode("candles:BTC/USD:1m", br#"[{"time":60}]"#).is_err());
    }

    #[test]
    fn trade_and_candle_payloads_decode_by_family() {
        let body = br#"[{"id":7,"time":1000,"price":10.0,"amount":0.1}]"#;
        assert!(matches!(
            decode("trades:BTC/USD", body).unwrap().unwrap(),
            FeedUpdate::Incremental(FamilyRecord::Trade(_))
        ));

        let body =
            br#"[{"time":60,"open":1,"high":2,"low":0.5,"close":1.5,"volume":10}]"#;
        assert!(matches!(
            decode("candles:BTC/USD:1m", body).unwrap().unwrap(),
            FeedUpdate::Incremental(FamilyRecord::Candle(_))
        ));
    }
}

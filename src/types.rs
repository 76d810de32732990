// =============================================================================
// Shared types used across the Meridian bot runtime
// =============================================================================

use serde::{Deserialize, Serialize};

/// Topic family, derived from the topic's string prefix. The family decides
/// how payloads for the topic are decoded and merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicFamily {
    Book,
    Trades,
    Candles,
}

impl TopicFamily {
    /// Derive the family from a topic string, e.g. `book:BTC/USD` → `Book`.
    /// Returns `None` for topics outside the known families.
    pub fn of(topic: &str) -> Option<Self> {
        if topic.starts_with("book") {
            Some(Self::Book)
        } else if topic.starts_with("trades") {
            Some(Self::Trades)
        } else if topic.starts_with("candles") {
            Some(Self::Candles)
        } else {
            None
        }
    }
}

impl std::fmt::Display for TopicFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Book => write!(f, "book"),
            Self::Trades => write!(f, "trades"),
            Self::Candles => write!(f, "candles"),
        }
    }
}

/// What caused an algorithm run to be admitted.
#[derive(Debug, Clone)]
pub enum TriggerCause {
    /// A message arrived on a configured trigger topic.
    Feed(String),
    /// A manual trigger request arrived on the remote trigger gateway,
    /// carrying the request payload.
    Manual(serde_json::Value),
}

impl std::fmt::Display for TriggerCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feed(topic) => write!(f, "feed:{topic}"),
            Self::Manual(_) => write!(f, "manual"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_from_topic_prefix() {
        assert_eq!(TopicFamily::of("book:BTC/USD"), Some(TopicFamily::Book));
        assert_eq!(TopicFamily::of("trades:BTC/USD"), Some(TopicFamily::Trades));
        assert_eq!(
            TopicFamily::of("candles:BTC/USD:1m"),
            Some(TopicFamily::Candles)
        );
        assert_eq!(TopicFamily::of("ticker:BTC/USD"), None);
        assert_eq!(TopicFamily::of(""), None);
    }

    #[test]
    fn trigger_cause_display() {
        let feed = TriggerCause::Feed("trades:BTC/USD".into());
        assert_eq!(feed.to_string(), "feed:trades:BTC/USD");

        let manual = TriggerCause::Manual(serde_json::json!({"reason": "test"}));
        assert_eq!(manual.to_string(), "manual");
    }
}

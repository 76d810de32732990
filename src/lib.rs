//! # Meridian Trading Bot Runtime
//!
//! Client-side runtime for the Meridian venue: maintains a local,
//! continuously-updated view of market data and account-order state streamed
//! over ZeroMQ, and dispatches a user-supplied trading algorithm in response.
//!
//! ## Modules
//! - `market_data`: Per-topic order book, trade tape, and candle series state.
//! - `feed`: Data feed decoding and the snapshot-then-stream ingestion loop.
//! - `orders`: Order state tracking, order-events ingestion, and the Order
//!   Manager REST client.
//! - `gate`: At-most-one-running admission control for algorithm runs.
//! - `dispatch`: Spawns admitted algorithm runs with timeout containment.
//! - `trigger`: REQ-REP gateway for manually triggered runs.
//! - `bot`: The `TradingBot` facade tying everything together.

pub mod algo;
pub mod bot;
pub mod config;
pub mod dispatch;
pub mod feed;
pub mod gate;
pub mod market_data;
pub mod orders;
pub mod trigger;
pub mod types;

pub use algo::{AlgoContext, Algorithm};
pub use bot::TradingBot;
pub use config::BotConfig;
pub use types::{TopicFamily, TriggerCause};

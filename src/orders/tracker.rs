// =============================================================================
// Order State Tracker — order id → latest known order fields
// =============================================================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Map, Value};

/// One order-lifecycle event from the order events feed. The only required
/// field is the venue-assigned `id`; everything else is free-form.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEvent {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Latest known state of one order.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: i64,
    pub fields: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn status(&self) -> Option<&str> {
        self.fields.get("status").and_then(Value::as_str)
    }
}

/// Tracks placed-order state fed by the order ingestion loop.
///
/// All access goes through one exclusive lock: events merge atomically and
/// readers receive cloned records, never a record mid-merge. Events for the
/// same id are last-writer-wins; events for different ids are unordered with
/// respect to each other.
#[derive(Debug, Default)]
pub struct OrderTracker {
    orders: Mutex<HashMap<i64, OrderRecord>>,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one order event: overwrite the fields it carries, keep the rest.
    pub fn apply(&self, event: OrderEvent) {
        let mut orders = self.orders.lock();
        match orders.get_mut(&event.id) {
            Some(record) => {
                for (key, value) in event.fields {
                    record.fields.insert(key, value);
                }
                record.updated_at = Utc::now();
            }
            None => {
                orders.insert(
                    event.id,
                    OrderRecord {
                        id: event.id,
                        fields: event.fields,
                        updated_at: Utc::now(),
                    },
                );
            }
        }
    }

    /// Copy of one order's latest state.
    pub fn get(&self, id: i64) -> Option<OrderRecord> {
        self.orders.lock().get(&id).cloned()
    }

    /// Copy of all tracked orders.
    pub fn snapshot(&self) -> HashMap<i64, OrderRecord> {
        self.orders.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

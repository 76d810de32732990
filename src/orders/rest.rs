// =============================================================================
// Order Manager REST Client — HMAC-SHA256 signed requests
// =============================================================================
//
// SECURITY: The secret key is never logged or serialized. Every request
// carries the MERIDIAN-API-KEY header plus a timestamped HMAC signature of
// the request payload.
// =============================================================================

use anyhow::{Context, Result};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Map, Value};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the client's API key on every request.
pub const API_KEY_HEADER: &str = "MERIDIAN-API-KEY";
/// Header carrying the request signature.
const SIGNATURE_HEADER: &str = "MERIDIAN-API-SIGN";
/// Header carrying the signing timestamp (milliseconds).
const TIMESTAMP_HEADER: &str = "MERIDIAN-API-TS";

// ---------------------------------------------------------------------------
// Authentication response
// ---------------------------------------------------------------------------

/// Endpoint locators returned by a successful authentication call. All three
/// are required; a missing one is a fatal startup error.
#[derive(Debug, Clone)]
pub struct AuthEndpoints {
    pub data_feed_sub_url: String,
    pub data_feed_req_url: String,
    pub order_events_sub_url: String,
}

impl AuthEndpoints {
    pub fn from_response(body: &Value) -> Result<Self> {
        let field = |name: &str| -> Result<String> {
            body.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .with_context(|| format!("authentication response missing '{name}'"))
        };

        Ok(Self {
            data_feed_sub_url: field("data_feed_sub_url")?,
            data_feed_req_url: field("data_feed_req_url")?,
            order_events_sub_url: field("order_events_sub_url")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Order placement request
// ---------------------------------------------------------------------------

/// BUY or SELL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A validated order placement request.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub asset_id: i64,
    pub amount: f64,
    pub action: OrderAction,
    pub order_type: i64,
    pub broker: String,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub extra: Map<String, Value>,
}

impl PlaceOrder {
    pub fn validate(&self) -> Result<()> {
        if self.amount <= 0.0 {
            anyhow::bail!("'amount' must be greater than 0");
        }
        Ok(())
    }

    /// Build the JSON payload, attaching a client-generated idempotency uuid.
    fn to_payload(&self) -> Value {
        let mut payload = json!({
            "asset": { "id": self.asset_id },
            "amount": self.amount,
            "action": self.action.to_string(),
            "type": self.order_type,
            "broker": self.broker,
            "uuid": Uuid::new_v4().to_string(),
            "extra": Value::Object(self.extra.clone()),
        });
        if let Some(limit) = self.limit_price {
            payload["limitPrice"] = json!(limit);
        }
        if let Some(stop) = self.stop_price {
            payload["stopPrice"] = json!(stop);
        }
        payload
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// REST client for the Meridian Order Manager API.
#[derive(Clone)]
pub struct OrderManagerClient {
    secret: String,
    base_url: String,
    client: reqwest::Client,
}

impl OrderManagerClient {
    /// # Arguments
    /// * `api_key` — client API key (sent as a header, never in query params).
    /// * `secret`  — secret key used exclusively for HMAC signing.
    /// * `base_url` — e.g. `http://localhost:8080`.
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let api_key = api_key.into();

        let mut default_headers = HeaderMap::new();
        if let Ok(val) = HeaderValue::from_str(&api_key) {
            default_headers.insert(API_KEY_HEADER, val);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            secret: secret.into(),
            base_url: base_url.into(),
            client,
        }
    }

    // -------------------------------------------------------------------------
    // Signing helpers
    // -------------------------------------------------------------------------

    /// HMAC-SHA256 hex signature of `payload`.
    pub fn sign(&self, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Current UNIX timestamp in milliseconds.
    pub fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX epoch")
            .as_millis() as u64
    }

    // -------------------------------------------------------------------------
    // Request plumbing
    // -------------------------------------------------------------------------

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let ts = Self::timestamp_ms();
        let canonical: String = query
            .iter()
            .map(|(k, v)| format!("{k}={v}&"))
            .collect::<String>()
            + &ts.to_string();
        let sig = self.sign(&format!("{path}{canonical}"));

        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .header(TIMESTAMP_HEADER, ts)
            .header(SIGNATURE_HEADER, sig)
            .send()
            .await
            .with_context(|| format!("GET {path} request failed"))?;

        Self::read_json(path, resp).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
        let ts = Self::timestamp_ms();
        let raw = body.to_string();
        let sig = self.sign(&format!("{path}{ts}{raw}"));

        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .header(TIMESTAMP_HEADER, ts)
            .header(SIGNATURE_HEADER, sig)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {path} request failed"))?;

        Self::read_json(path, resp).await
    }

    async fn read_json(path: &str, resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {path} response"))?;

        if !status.is_success() {
            anyhow::bail!("order manager {path} returned {status}: {body}");
        }
        Ok(body)
    }

    // -------------------------------------------------------------------------
    // API surface
    // -------------------------------------------------------------------------

    /// GET /api/client/auth — authenticate and fetch the stream endpoints.
    #[instrument(skip(self), name = "order_manager::authenticate")]
    pub async fn authenticate(&self) -> Result<AuthEndpoints> {
        let body = self.get_json("/api/client/auth", &[]).await?;
        let endpoints = AuthEndpoints::from_response(&body)?;
        debug!("authenticated with order manager");
        Ok(endpoints)
    }

    /// GET /api/order/get — info about a specific order.
    #[instrument(skip(self), name = "order_manager::get_order")]
    pub async fn get_order(&self, order_id: i64) -> Result<Value> {
        self.get_json("/api/order/get", &[("id", order_id.to_string())])
            .await
    }

    /// GET /api/order/client — all orders for this client.
    #[instrument(skip(self), name = "order_manager::get_client_orders")]
    pub async fn get_client_orders(&self) -> Result<Value> {
        self.get_json("/api/order/client", &[]).await
    }

    /// GET /api/asset/get — info about a specific asset.
    #[instrument(skip(self), name = "order_manager::get_asset")]
    pub async fn get_asset(&self, asset_id: i64) -> Result<Value> {
        self.get_json("/api/asset/get", &[("id", asset_id.to_string())])
            .await
    }

    /// GET /api/asset/list — all tradeable assets.
    #[instrument(skip(self), name = "order_manager::get_assets")]
    pub async fn get_assets(&self) -> Result<Value> {
        self.get_json("/api/asset/list", &[]).await
    }

    /// POST /api/order/create — place a BUY/SELL order.
    #[instrument(skip(self, order), name = "order_manager::place_order")]
    pub async fn place_order(&self, order: &PlaceOrder) -> Result<Value> {
        order.validate()?;
        let body = self.post_json("/api/order/create", order.to_payload()).await?;
        debug!(asset_id = order.asset_id, action = %order.action, "order placed");
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OrderManagerClient {
        OrderManagerClient::new("test-key", "test-secret", "http://localhost:8080")
    }

    #[test]
    fn sign_is_deterministic_hex() {
        let c = client();
        let a = c.sign("payload");
        let b = c.sign("payload");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_ne!(a, c.sign("other payload"));
    }

    #[test]
    fn auth_endpoints_require_all_three_urls() {
        let full = json!({
            "data_feed_sub_url": "tcp://feed:5555",
            "data_feed_req_url": "tcp://feed:5556",
            "order_events_sub_url": "tcp://orders:5557",
        });
        let endpoints = AuthEndpoints::from_response(&full).unwrap();
        assert_eq!(endpoints.data_feed_sub_url, "tcp://feed:5555");
        assert_eq!(endpoints.order_events_sub_url, "tcp://orders:5557");

        let partial = json!({
            "data_feed_sub_url": "tcp://feed:5555",
            "data_feed_req_url": "tcp://feed:5556",
        });
        let err = AuthEndpoints::from_response(&partial).unwrap_err();
        assert!(err.to_string().contains("order_events_sub_url"));

        // An empty URL is as fatal as a missing one.
        let empty = json!({
            "data_feed_sub_url": "",
            "data_feed_req_url": "tcp://feed:5556",
            "order_events_sub_url": "tcp://orders:5557",
        });
        assert!(AuthEndpoints::from_response(&empty).is_err());
    }

    #[test]
    fn place_order_rejects_non_positive_amount() {
        let order = PlaceOrder {
            asset_id: 1,
            amount: 0.0,
            action: OrderAction::Buy,
            order_type: 1,
            broker: "IB".into(),
            limit_price: None,
            stop_price: None,
            extra: Map::new(),
        };
        assert!(order.validate().is_err());
    }

    #[test]
    fn payload_includes_uuid_and_optional_prices() {
        let mut order = PlaceOrder {
            asset_id: 7,
            amount: 2.5,
            action: OrderAction::Sell,
            order_type: 2,
            broker: "IB".into(),
            limit_price: Some(101.5),
            stop_price: None,
            extra: Map::new(),
        };

        let payload = order.to_payload();
        assert_eq!(payload["asset"]["id"], 7);
        assert_eq!(payload["action"], "SELL");
        assert_eq!(payload["limitPrice"], 101.5);
        assert!(payload.get("stopPrice").is_none());
        assert!(!payload["uuid"].as_str().unwrap().is_empty());

        order.limit_price = None;
        order.stop_price = Some(99.0);
        let payload = order.to_payload();
        assert!(payload.get("limitPrice").is_none());
        assert_eq!(payload["stopPrice"], 99.0);
    }
}

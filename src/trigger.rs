// =============================================================================
// Remote Trigger Gateway — REQ-REP channel for manually triggered runs
// =============================================================================
//
// One request at a time. Every request gets exactly one reply, sent before
// the triggered run completes; decode failures are reported in the reply
// payload and the loop continues.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};
use zeromq::{Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::dispatch::Dispatcher;
use crate::types::TriggerCause;

/// Reply payload for the trigger channel.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerReply {
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriggerReply {
    pub fn ok() -> Self {
        Self {
            message: "Algorithm triggered successfully.".into(),
            error: None,
        }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            message: "Something went wrong.".into(),
            error: Some(error.to_string()),
        }
    }
}

/// Decode the request body as free-form JSON.
fn decode_request(msg: &ZmqMessage) -> Result<serde_json::Value> {
    let body = msg.get(0).context("empty trigger request")?;
    serde_json::from_slice(body.as_ref()).context("trigger request is not valid JSON")
}

/// Run the remote trigger gateway until shutdown or socket failure.
pub async fn run_trigger_gateway(
    bind: &str,
    dispatcher: &Arc<Dispatcher>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<()> {
    let mut rep = zeromq::RepSocket::new();
    rep.bind(bind)
        .await
        .with_context(|| format!("failed to bind remote trigger endpoint {bind}"))?;

    info!(endpoint = %bind, "remote trigger gateway listening");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("remote trigger gateway shutting down");
                    return Ok(());
                }
            }
            msg = rep.recv() => {
                let msg = msg.context("remote trigger receive failed")?;

                let reply = match decode_request(&msg) {
                    Ok(payload) => {
                        info!("manual trigger accepted");
                        dispatcher.trigger_persistent(TriggerCause::Manual(payload));
                        TriggerReply::ok()
                    }
                    Err(e) => {
                        warn!(error = %e, "rejecting malformed trigger request");
                        TriggerReply::failure(e)
                    }
                };

                // The REP socket needs its reply no matter what, or the
                // channel deadlocks for the next request.
                let body = serde_json::to_string(&reply)
                    .unwrap_or_else(|_| r#"{"Message":"Something went wrong."}"#.to_string());
                rep.send(ZmqMessage::from(body))
                    .await
                    .context("failed to send trigger reply")?;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_reply_has_no_error_field() {
        let json = serde_json::to_value(TriggerReply::ok()).unwrap();
        assert_eq!(json["Message"], "Algorithm triggered successfully.");
        assert!(json.get("Error").is_none());
    }

    #[test]
    fn failure_reply_carries_the_error() {
        let json = serde_json::to_value(TriggerReply::failure("bad request")).unwrap();
        assert_eq!(json["Message"], "Something went wrong.");
        assert_eq!(json["Error"], "bad request");
    }
}

use super::connection::ConnectionManager;
use crate::channel::channel_topic;
use crate::types::constants::{BROADCAST_MESSAGE_EVENT, channel_events};
use crate::types::{Envelope, RealtimeError, Result};
use serde::Serialize;
use serde_json::value::RawValue;
use std::sync::Arc;

#[derive(Serialize)]
struct BroadcastPayload<'a> {
    event: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    payload: Box<RawValue>,
}

/// Sends broadcast frames over the session's live transport.
///
/// Cheap to clone. Nothing is queued: with no live transport a publish fails
/// with [`RealtimeError::NotConnected`] and the caller decides whether to retry.
#[derive(Clone)]
pub struct Publisher {
    connection: Arc<ConnectionManager>,
}

impl Publisher {
    pub(crate) fn new(connection: Arc<ConnectionManager>) -> Self {
        Self { connection }
    }

    /// Broadcasts `payload` on `realtime:<topic>`.
    ///
    /// Valid JSON is embedded as is; anything else is sent as
    /// `{"data": "<payload as text>"}`.
    pub async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let envelope = broadcast_envelope(topic, payload)?;
        let msg_ref = self.connection.send(envelope).await?;
        tracing::debug!(topic, msg_ref = %msg_ref, "Sent broadcast via WebSocket");
        Ok(())
    }
}

/// Builds the outbound broadcast envelope. The ref is stamped at write time.
pub fn broadcast_envelope(topic: &str, payload: &[u8]) -> Result<Envelope> {
    if topic.is_empty() {
        return Err(RealtimeError::Channel(
            "publish topic must not be empty".to_string(),
        ));
    }

    let inner = match serde_json::from_slice::<Box<RawValue>>(payload) {
        Ok(json) => json,
        Err(_) => serde_json::value::to_raw_value(&serde_json::json!({
            "data": String::from_utf8_lossy(payload),
        }))?,
    };

    Envelope::from_value(
        channel_topic(topic),
        channel_events::BROADCAST,
        &BroadcastPayload {
            event: BROADCAST_MESSAGE_EVENT,
            kind: channel_events::BROADCAST,
            payload: inner,
        },
    )
}

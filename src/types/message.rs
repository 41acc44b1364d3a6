use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::constants::{PHOENIX_TOPIC, phoenix_events};
use super::error::{RealtimeError, Result};

/// A Phoenix Channels v1 frame.
///
/// The payload is kept as an already-encoded JSON document so that handler
/// payloads are forwarded exactly as the server sent them, without a second
/// decode pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub event: String,
    #[serde(default = "null_payload")]
    pub payload: Box<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

fn null_payload() -> Box<RawValue> {
    RawValue::NULL.to_owned()
}

impl Envelope {
    pub fn new(topic: impl Into<String>, event: impl Into<String>, payload: Box<RawValue>) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            payload,
            r#ref: None,
            join_ref: None,
        }
    }

    /// Builds an envelope whose payload is the JSON encoding of `payload`.
    pub fn from_value<T: Serialize + ?Sized>(
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: &T,
    ) -> Result<Self> {
        let raw = serde_json::value::to_raw_value(payload)?;
        Ok(Self::new(topic, event, raw))
    }

    /// Heartbeat frame on the reserved `phoenix` topic. The ref is stamped at write time.
    pub fn heartbeat() -> Result<Self> {
        Self::from_value(
            PHOENIX_TOPIC,
            phoenix_events::HEARTBEAT,
            &serde_json::json!({}),
        )
    }

    pub fn with_ref(mut self, r#ref: String) -> Self {
        self.r#ref = Some(r#ref);
        self
    }

    pub fn with_join_ref(mut self, join_ref: String) -> Self {
        self.join_ref = Some(join_ref);
        self
    }

    /// Assigns a fresh ref. A join also takes it as its `join_ref`.
    pub fn stamp(&mut self, r#ref: String) {
        if self.is_join() {
            self.join_ref = Some(r#ref.clone());
        }
        self.r#ref = Some(r#ref);
    }

    pub fn is_join(&self) -> bool {
        self.event == phoenix_events::JOIN
    }

    /// Raw JSON bytes of the payload.
    pub fn payload_bytes(&self) -> &[u8] {
        self.payload.get().as_bytes()
    }

    /// Encodes the envelope as a single JSON object.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a single JSON object. Unknown top-level fields are ignored.
    pub fn decode(text: &str) -> Result<Self> {
        if !text.trim_start().starts_with('{') {
            return Err(RealtimeError::MalformedFrame(
                "frame is not a JSON object".to_string(),
            ));
        }
        serde_json::from_str(text).map_err(|e| RealtimeError::MalformedFrame(e.to_string()))
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.topic == other.topic
            && self.event == other.event
            && self.payload.get() == other.payload.get()
            && self.r#ref == other.r#ref
            && self.join_ref == other.join_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> Box<RawValue> {
        RawValue::from_string(json.to_string()).unwrap()
    }

    #[test]
    fn test_envelope_round_trip() {
        let envelope = Envelope::new("realtime:room", "broadcast", raw(r#"{"text":"hi"}"#))
            .with_ref("7".to_string())
            .with_join_ref("3".to_string());

        let encoded = envelope.encode().unwrap();
        let decoded = Envelope::decode(&encoded).unwrap();

        assert_eq!(envelope, decoded);
    }

    #[test]
    fn test_encode_omits_missing_refs() {
        let envelope = Envelope::new("realtime:room", "broadcast", raw("{}"));
        let json = envelope.encode().unwrap();
        assert!(!json.contains(r#""ref":"#));
        assert!(!json.contains(r#""join_ref":"#));
    }

    #[test]
    fn test_payload_is_forwarded_verbatim() {
        let text = r#"{"topic":"realtime:room","event":"broadcast","payload":{"b":1,  "a":[true]}}"#;
        let envelope = Envelope::decode(text).unwrap();
        assert_eq!(envelope.payload_bytes(), br#"{"b":1,  "a":[true]}"#);
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let text = r#"{"topic":"phoenix","event":"phx_reply","payload":{},"ref":"1","extra":42}"#;
        let envelope = Envelope::decode(text).unwrap();
        assert_eq!(envelope.topic, "phoenix");
        assert_eq!(envelope.r#ref.as_deref(), Some("1"));
        assert_eq!(envelope.join_ref, None);
    }

    #[test]
    fn test_decode_null_refs() {
        let text = r#"{"topic":"realtime:room","event":"broadcast","payload":{},"ref":null,"join_ref":null}"#;
        let envelope = Envelope::decode(text).unwrap();
        assert_eq!(envelope.r#ref, None);
        assert_eq!(envelope.join_ref, None);
    }

    #[test]
    fn test_decode_missing_payload_defaults_to_null() {
        let envelope = Envelope::decode(r#"{"topic":"t","event":"e"}"#).unwrap();
        assert_eq!(envelope.payload.get(), "null");
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        let cases = [
            "not json",
            r#"["1","1","realtime:room","broadcast",{}]"#,
            r#"{"event":"broadcast","payload":{}}"#,
            r#"{"topic":"realtime:room","payload":{}}"#,
            r#"{"topic":"realtime:room","event":5,"payload":{}}"#,
        ];
        for case in cases {
            assert!(
                matches!(Envelope::decode(case), Err(RealtimeError::MalformedFrame(_))),
                "expected MalformedFrame for {}",
                case
            );
        }
    }

    #[test]
    fn test_stamp_sets_join_ref_only_for_joins() {
        let mut join = Envelope::new("realtime:room", phoenix_events::JOIN, raw("{}"));
        join.stamp("4".to_string());
        assert_eq!(join.r#ref.as_deref(), Some("4"));
        assert_eq!(join.join_ref.as_deref(), Some("4"));

        let mut heartbeat = Envelope::heartbeat().unwrap();
        heartbeat.stamp("5".to_string());
        assert_eq!(heartbeat.r#ref.as_deref(), Some("5"));
        assert_eq!(heartbeat.join_ref, None);
    }

    #[test]
    fn test_heartbeat_shape() {
        let heartbeat = Envelope::heartbeat().unwrap();
        assert_eq!(heartbeat.topic, "phoenix");
        assert_eq!(heartbeat.event, "heartbeat");
        assert_eq!(heartbeat.payload.get(), "{}");
    }
}

//! Sync message
//!
//! Wire form (JSON object, sent to any origin):
//! - `kind`: always `SYNC_MARKER`
//! - `speedMultiplier`: resume multiplier, a number or the string `"Infinity"`
//! - `paused`: boolean
//!
//! Messages without the marker belong to the page and decode to `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use timewarp_core::{PlaybackState, Speed};

use crate::{WireError, WireResult};

/// Discriminant identifying our messages
pub const SYNC_MARKER: &str = "__timewarp_sync__";

/// Authoritative speed state sent from a document to its direct children
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyncMessage {
    pub speed_multiplier: f64,
    pub paused: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    kind: String,
    #[serde(with = "wire_speed")]
    speed_multiplier: f64,
    paused: bool,
}

mod wire_speed {
    use serde::{Deserialize, Deserializer, Serializer};

    const INFINITY: &str = "Infinity";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() && value.is_sign_positive() {
            serializer.serialize_str(INFINITY)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) if s == INFINITY => Ok(f64::INFINITY),
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "unexpected speed literal {s:?}"
            ))),
        }
    }
}

impl SyncMessage {
    pub fn new(speed_multiplier: f64, paused: bool) -> Self {
        SyncMessage {
            speed_multiplier,
            paused,
        }
    }

    /// Message describing a document's playback state
    pub fn from_state(state: PlaybackState) -> Self {
        SyncMessage {
            speed_multiplier: state.speed.value(),
            paused: state.paused,
        }
    }

    /// Validated multiplier carried by the message
    pub fn speed(&self) -> WireResult<Speed> {
        Speed::new(self.speed_multiplier).map_err(|_| WireError::InvalidSpeed(self.speed_multiplier))
    }

    /// Encode into the value posted over the messaging channel
    pub fn encode(&self) -> Value {
        let envelope = Envelope {
            kind: SYNC_MARKER.to_string(),
            speed_multiplier: self.speed_multiplier,
            paused: self.paused,
        };
        serde_json::to_value(envelope).unwrap_or(Value::Null)
    }

    /// Decode a received value.
    ///
    /// Returns `Ok(None)` for anything not carrying the sync marker.
    pub fn decode(value: &Value) -> WireResult<Option<Self>> {
        let marked = value
            .get("kind")
            .and_then(Value::as_str)
            .map_or(false, |kind| kind == SYNC_MARKER);
        if !marked {
            return Ok(None);
        }

        let envelope = Envelope::deserialize(value).map_err(|e| WireError::Malformed(e.to_string()))?;
        let message = SyncMessage {
            speed_multiplier: envelope.speed_multiplier,
            paused: envelope.paused,
        };
        message.speed()?;
        Ok(Some(message))
    }

    /// Decode a textual payload
    pub fn decode_str(payload: &str) -> WireResult<Option<Self>> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| WireError::NotJson(e.to_string()))?;
        Self::decode(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let value = SyncMessage::new(0.25, false).encode();
        assert_eq!(
            value,
            json!({ "kind": SYNC_MARKER, "speedMultiplier": 0.25, "paused": false })
        );
    }

    #[test]
    fn test_infinity_is_encoded_as_text() {
        let value = SyncMessage::new(f64::INFINITY, false).encode();
        assert_eq!(value["speedMultiplier"], json!("Infinity"));

        let decoded = SyncMessage::decode(&value).unwrap().unwrap();
        assert!(decoded.speed_multiplier.is_infinite());
    }

    #[test]
    fn test_foreign_messages_are_ignored() {
        assert!(SyncMessage::decode(&json!("hello")).unwrap().is_none());
        assert!(SyncMessage::decode(&json!({ "kind": "other" })).unwrap().is_none());
        assert!(SyncMessage::decode(&json!({ "type": "resize", "w": 3 })).unwrap().is_none());
    }

    #[test]
    fn test_marked_but_malformed_is_an_error() {
        let missing = json!({ "kind": SYNC_MARKER, "paused": true });
        assert!(matches!(SyncMessage::decode(&missing), Err(WireError::Malformed(_))));

        let negative = json!({ "kind": SYNC_MARKER, "speedMultiplier": -2.0, "paused": false });
        assert!(matches!(SyncMessage::decode(&negative), Err(WireError::InvalidSpeed(_))));

        let literal = json!({ "kind": SYNC_MARKER, "speedMultiplier": "fast", "paused": false });
        assert!(SyncMessage::decode(&literal).is_err());
    }

    #[test]
    fn test_decode_text_payload() {
        let text = format!(r#"{{"kind":"{SYNC_MARKER}","speedMultiplier":2,"paused":true}}"#);
        let message = SyncMessage::decode_str(&text).unwrap().unwrap();
        assert_eq!(message, SyncMessage::new(2.0, true));

        assert!(matches!(SyncMessage::decode_str("{"), Err(WireError::NotJson(_))));
    }

    #[test]
    fn test_from_state_carries_resume_multiplier() {
        let state = PlaybackState::new(Speed::new(0.5).unwrap(), true);
        assert_eq!(SyncMessage::from_state(state), SyncMessage::new(0.5, true));
    }

    proptest! {
        #[test]
        fn prop_unmarked_payloads_are_never_ours(
            kind in "[a-z_]{0,24}",
            speed in 0.0f64..100.0,
            paused in any::<bool>(),
        ) {
            prop_assume!(kind != SYNC_MARKER);
            let value = json!({ "kind": kind, "speedMultiplier": speed, "paused": paused });
            prop_assert!(SyncMessage::decode(&value).unwrap().is_none());
        }
    }
}

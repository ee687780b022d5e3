//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The server never touches a serialization format directly. The
//! connection handler holds some `C: Codec` and asks it to turn envelopes
//! into bytes and back, so swapping JSON for a binary format is a one-line
//! change in the server builder.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// truncated, or do not match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Browser clients speak JSON text frames, so this is the default.
///
/// ## Example
///
/// ```rust
/// use hexdeck_protocol::{Codec, Envelope, JsonCodec, Payload, SystemMessage};
///
/// let codec = JsonCodec;
/// let envelope: Envelope<()> = Envelope {
///     seq: 1,
///     timestamp: 5000,
///     payload: Payload::System(SystemMessage::Heartbeat { client_time: 5000 }),
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope<()> = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Envelope, Payload, PlayerId, RoomId, SystemMessage};

    #[test]
    fn test_json_codec_decode_rejects_garbage() {
        let result: Result<Envelope<()>, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_decode_rejects_unknown_system_message() {
        let raw = br#"{"seq":0,"timestamp":0,"payload":{"type":"System","data":{"type":"Teleport"}}}"#;
        let result: Result<Envelope<()>, _> = JsonCodec.decode(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_codec_preserves_handshake_ack() {
        let envelope: Envelope<()> = Envelope {
            seq: 3,
            timestamp: 10,
            payload: Payload::System(SystemMessage::HandshakeAck {
                player_id: PlayerId(7),
                room_id: RoomId(9),
                server_time: 10,
            }),
        };
        let bytes = JsonCodec.encode(&envelope).unwrap();
        let decoded: Envelope<()> = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }
}

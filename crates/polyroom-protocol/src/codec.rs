//! Turning events into relay frames and back.
//!
//! A client only ever writes [`ClientEvent`]s and reads [`ServerEvent`]s, so
//! the [`Codec`] trait is typed to exactly that pair.

use crate::{ClientEvent, ProtocolError, ServerEvent};

/// Frame format spoken with the relay.
///
/// One codec is shared by the session actor and every adapter task.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// [`ProtocolError::Encode`] if the event cannot be serialized.
    fn encode(&self, event: &ClientEvent) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// [`ProtocolError::Decode`] for malformed frames or unknown event
    /// names, [`ProtocolError::InvalidEvent`] for empty frames.
    fn decode(&self, frame: &[u8]) -> Result<ServerEvent, ProtocolError>;
}

/// JSON text frames: `{"event": "<name>", "data": {...}}`.
///
/// ```rust
/// use polyroom_protocol::{ClientEvent, Codec, JsonCodec, RoomCode};
///
/// let frame = JsonCodec
///     .encode(&ClientEvent::GetRecordings {
///         room_code: RoomCode::new("ABC123"),
///     })
///     .unwrap();
/// assert_eq!(frame, br#"{"event":"get-recordings","data":{"roomCode":"ABC123"}}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode(&self, event: &ClientEvent) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(event).map_err(ProtocolError::Encode)
    }

    fn decode(&self, frame: &[u8]) -> Result<ServerEvent, ProtocolError> {
        if frame.iter().all(u8::is_ascii_whitespace) {
            return Err(ProtocolError::InvalidEvent("empty frame".into()));
        }
        serde_json::from_slice(frame).map_err(ProtocolError::Decode)
    }
}

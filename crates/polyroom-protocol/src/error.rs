//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding relay events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into an event).
    ///
    /// Common causes: malformed JSON, an event name this client does not
    /// know, or a payload missing required fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event decoded but violates a protocol rule.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

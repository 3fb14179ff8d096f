//! Error types for the relay adapters.

/// A request rejected locally before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("recording transcript is empty")]
    EmptyTranscript,

    #[error("recording audio is empty")]
    EmptyAudio,

    #[error("target language is empty")]
    EmptyLanguage,

    #[error("recording has zero duration")]
    ZeroDuration,
}

/// Errors from pushing an event to the relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The session is not joined; nothing was sent.
    #[error("session is not joined to a room")]
    NotConnected,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Encoding or writing the event failed.
    #[error("failed to send {event}: {source}")]
    Send {
        event: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

//! One-shot recording upload.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use polyroom_protocol::ClientEvent;

use crate::{EventSink, Origin, RelayError, ValidationError};

/// A finished voice recording ready to be saved by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingRequest {
    /// Raw audio bytes, sent as plain base64.
    pub audio: Vec<u8>,
    /// What was said, as transcribed locally.
    pub original_text: String,
    pub target_language: String,
    pub duration: Duration,
}

impl RecordingRequest {
    /// Checks the request without sending anything.
    ///
    /// # Errors
    /// A [`ValidationError`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.original_text.trim().is_empty() {
            return Err(ValidationError::EmptyTranscript);
        }
        if self.audio.is_empty() {
            return Err(ValidationError::EmptyAudio);
        }
        if self.target_language.trim().is_empty() {
            return Err(ValidationError::EmptyLanguage);
        }
        if self.duration.is_zero() {
            return Err(ValidationError::ZeroDuration);
        }
        Ok(())
    }

    /// Validates and builds the `save-recording` event for `origin`.
    pub fn into_event(self, origin: &Origin) -> Result<ClientEvent, ValidationError> {
        self.validate()?;
        Ok(ClientEvent::SaveRecording {
            room_code: origin.room_code.clone(),
            user_id: origin.user_id.clone(),
            audio_blob: STANDARD.encode(&self.audio),
            original_text: self.original_text.trim().to_owned(),
            target_language: self.target_language,
            duration: self.duration.as_secs_f64(),
        })
    }
}

/// Validates `request` and sends one `save-recording`.
///
/// Nothing is sent if validation fails or the session is not joined. The
/// relay answers later with `recording-saved` or `recording-error`.
pub async fn save_recording<S: EventSink>(
    sink: &S,
    origin: &Origin,
    request: RecordingRequest,
) -> Result<(), RelayError> {
    let event = request.into_event(origin)?;
    if !sink.is_connected() {
        return Err(RelayError::NotConnected);
    }
    tracing::info!(room = %origin.room_code, user = %origin.user_id, "saving recording");
    sink.send(event).await
}

//! Capture seams: where artifacts come from.
//!
//! Capture devices, codecs, and speech recognizers live outside this crate.
//! They plug in through [`ArtifactSource`].

use std::future::Future;
use std::ops::{Deref, DerefMut};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Errors a capture source can report for one tick.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The source has nothing to offer right now (device busy, no frame
    /// ready). The tick is skipped.
    #[error("capture source unavailable")]
    Unavailable,

    /// Capture was attempted and failed. The tick is skipped.
    #[error("capture failed: {0}")]
    Failed(String),

    /// The underlying stream ended for good. The adapter stops.
    #[error("capture stream ended")]
    Ended,
}

/// A producer of artifacts for one periodic adapter.
///
/// `capture` is called once per cadence tick. A slow capture makes the
/// adapter miss ticks; it never makes them pile up.
pub trait ArtifactSource: Send + 'static {
    type Artifact: Send;

    fn capture(
        &mut self,
    ) -> impl Future<Output = Result<Self::Artifact, CaptureError>> + Send;

    /// Frees the device. Called exactly once when the adapter exits,
    /// whatever the reason.
    fn release(&mut self) {}
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// One encoded still image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// e.g. `image/jpeg`.
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl EncodedFrame {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            mime: "image/jpeg".to_owned(),
            bytes,
        }
    }

    /// Renders the frame as a base64 `data:` URL, the form the relay
    /// forwards to peers.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// One result from a speech recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechTranscript {
    pub text: String,
    /// Interim results are superseded by later ones and never sent.
    pub is_final: bool,
}

impl SpeechTranscript {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    /// The trimmed text if this transcript should be sent.
    pub(crate) fn sendable(&self) -> Option<&str> {
        let text = self.text.trim();
        (self.is_final && !text.is_empty()).then_some(text)
    }
}

// ---------------------------------------------------------------------------
// SourceGuard
// ---------------------------------------------------------------------------

/// Owns a source for the life of an adapter task and releases it on drop.
///
/// Covers every exit: cancellation, end of stream, and a panicking task.
pub(crate) struct SourceGuard<S: ArtifactSource> {
    source: S,
}

impl<S: ArtifactSource> SourceGuard<S> {
    pub(crate) fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: ArtifactSource> Deref for SourceGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: ArtifactSource> DerefMut for SourceGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: ArtifactSource> Drop for SourceGuard<S> {
    fn drop(&mut self) {
        self.source.release();
        tracing::debug!("capture source released");
    }
}

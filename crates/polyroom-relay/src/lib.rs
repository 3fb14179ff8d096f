//! Outbound relay adapters for Polyroom.
//!
//! Adapters push locally produced artifacts to the relay. Each periodic
//! adapter runs as its own task around a [`Cadence`]: on every tick it
//! captures one artifact from an [`ArtifactSource`] and sends one event
//! through an [`EventSink`]. Adapters never read room state.
//!
//! ```text
//! ArtifactSource ──capture──▶ adapter task ──ClientEvent──▶ EventSink
//!                               ▲
//!                            Cadence (100 ms, skip on overrun)
//! ```
//!
//! Perishable data is never queued or retried. A tick is skipped when the
//! capture fails or the session is not joined, and ticks missed while a
//! capture ran long are dropped.
//!
//! # Key types
//!
//! - [`AdapterSet`]: owns every adapter task of a session
//! - [`RelayHandle`]: stops one adapter and collects its [`RelayReport`]
//! - [`ArtifactSource`], [`EventSink`]: the seams to capture and transport
//! - [`RecordingRequest`] / [`save_recording`]: one-shot recording upload

mod adapter;
mod cadence;
mod capture;
mod error;
mod recording;
mod sink;

pub use adapter::{
    AdapterSet, RelayHandle, RelayReport, spawn_snapshots, spawn_transcripts,
};
pub use cadence::{Cadence, CadenceConfig, CadenceMetrics, TickInfo};
pub use capture::{ArtifactSource, CaptureError, EncodedFrame, SpeechTranscript};
pub use error::{RelayError, ValidationError};
pub use recording::{RecordingRequest, save_recording};
pub use sink::{EventSink, Origin};

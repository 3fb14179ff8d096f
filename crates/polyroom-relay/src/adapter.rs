//! Periodic adapter tasks and the set that owns them.

use std::future::Future;
use std::sync::Arc;

use polyroom_protocol::{ClientEvent, StreamKind, languages};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::capture::SourceGuard;
use crate::{
    ArtifactSource, Cadence, CadenceConfig, CaptureError, EncodedFrame,
    EventSink, Origin, RelayError, SpeechTranscript,
};

// ---------------------------------------------------------------------------
// RelayReport
// ---------------------------------------------------------------------------

/// What one adapter did over its lifetime. Returned when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Events delivered to the sink.
    pub sent: u64,
    /// Ticks skipped because the session was not joined or the send failed.
    pub skipped_disconnected: u64,
    /// Ticks skipped because capture failed.
    pub capture_failures: u64,
    /// Cadence ticks observed.
    pub ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Cancelled,
    EndOfStream,
}

// ---------------------------------------------------------------------------
// AdapterSet
// ---------------------------------------------------------------------------

/// Owns every adapter task of one session.
///
/// Created when the session opens and shut down exactly once when it
/// closes. Shutting down cancels every adapter and waits for them to exit,
/// so by the time [`AdapterSet::shutdown`] returns every capture source has
/// been released.
#[derive(Debug, Clone, Default)]
pub struct AdapterSet {
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` under this set with a child cancellation token.
    pub fn spawn<F, Fut>(&self, name: &'static str, task: F) -> RelayHandle
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = RelayReport> + Send + 'static,
    {
        let token = self.cancel.child_token();
        let join = self.tracker.spawn(task(token.clone()));
        tracing::debug!(adapter = name, "adapter spawned");
        RelayHandle {
            name,
            cancel: token,
            join,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels every adapter and waits until all have exited.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::debug!("all adapters stopped");
    }

    /// Number of adapter tasks still running.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }
}

// ---------------------------------------------------------------------------
// RelayHandle
// ---------------------------------------------------------------------------

/// Stops one adapter.
///
/// Dropping the handle leaves the adapter running until its
/// [`AdapterSet`] shuts down.
#[derive(Debug)]
pub struct RelayHandle {
    name: &'static str,
    cancel: CancellationToken,
    join: JoinHandle<RelayReport>,
}

impl RelayHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancels the adapter and waits for its report.
    pub async fn stop(self) -> RelayReport {
        self.cancel.cancel();
        match self.join.await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(adapter = self.name, error = %e, "adapter task failed");
                RelayReport::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Starts a snapshot adapter for one stream kind.
///
/// Each tick captures one [`EncodedFrame`] and sends it as a `data:` URL.
/// A secondary adapter also sends one `secondary-stream-stop` when it exits
/// while the session is still joined.
pub fn spawn_snapshots<Src, S>(
    set: &AdapterSet,
    kind: StreamKind,
    origin: Origin,
    config: CadenceConfig,
    source: Src,
    sink: Arc<S>,
) -> RelayHandle
where
    Src: ArtifactSource<Artifact = EncodedFrame>,
    S: EventSink,
{
    let name = match kind {
        StreamKind::Primary => "primary-snapshots",
        StreamKind::Secondary => "secondary-snapshots",
    };

    set.spawn(name, move |cancel| async move {
        let to_event = |frame: EncodedFrame| {
            Some(ClientEvent::snapshot(
                kind,
                origin.room_code.clone(),
                origin.user_id.clone(),
                frame.to_data_url(),
            ))
        };
        let (mut report, exit) =
            run_periodic(name, config, source, &*sink, &cancel, to_event).await;

        if kind == StreamKind::Secondary && sink.is_connected() {
            let stop = ClientEvent::SecondaryStreamStop {
                room_code: origin.room_code.clone(),
                user_id: origin.user_id.clone(),
            };
            match sink.send(stop).await {
                Ok(()) => report.sent += 1,
                Err(e) => tracing::debug!(error = %e, "secondary stop not sent"),
            }
        }

        tracing::info!(
            adapter = name,
            ?exit,
            sent = report.sent,
            ticks = report.ticks,
            "adapter stopped"
        );
        report
    })
}

/// Starts the transcript adapter.
///
/// Sends each final, non-blank transcript as a `transcript-chunk`. The
/// target language is read from `language` at send time, so a language
/// change applies to the next transcript without restarting the adapter.
pub fn spawn_transcripts<Src, S>(
    set: &AdapterSet,
    origin: Origin,
    config: CadenceConfig,
    source: Src,
    sink: Arc<S>,
    language: watch::Receiver<String>,
) -> RelayHandle
where
    Src: ArtifactSource<Artifact = SpeechTranscript>,
    S: EventSink,
{
    let name = "transcripts";

    set.spawn(name, move |cancel| async move {
        let to_event = |transcript: SpeechTranscript| {
            let text = transcript.sendable()?.to_owned();
            Some(ClientEvent::TranscriptChunk {
                room_code: origin.room_code.clone(),
                user_id: origin.user_id.clone(),
                text,
                source_lang: languages::SPEECH_SOURCE_LANGUAGE.to_owned(),
                target_lang: language.borrow().clone(),
            })
        };
        let (report, exit) =
            run_periodic(name, config, source, &*sink, &cancel, to_event).await;

        tracing::info!(
            adapter = name,
            ?exit,
            sent = report.sent,
            ticks = report.ticks,
            "adapter stopped"
        );
        report
    })
}

/// The loop shared by every periodic adapter.
///
/// Per tick: skip if detached, capture once, send at most one event.
/// `to_event` returning `None` consumes the tick without sending.
async fn run_periodic<Src, S, F>(
    name: &'static str,
    config: CadenceConfig,
    source: Src,
    sink: &S,
    cancel: &CancellationToken,
    mut to_event: F,
) -> (RelayReport, Exit)
where
    Src: ArtifactSource,
    S: EventSink,
    F: FnMut(Src::Artifact) -> Option<ClientEvent>,
{
    let mut source = SourceGuard::new(source);
    let mut cadence = Cadence::new(config);
    let mut report = RelayReport::default();

    tracing::info!(
        adapter = name,
        interval_ms = cadence.interval().as_millis() as u64,
        "adapter started"
    );

    let exit = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break Exit::Cancelled,
            _ = cadence.wait_for_tick() => {}
        }
        report.ticks += 1;

        if !sink.is_connected() {
            report.skipped_disconnected += 1;
            continue;
        }

        let captured = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Exit::Cancelled,
            captured = source.capture() => captured,
        };

        let artifact = match captured {
            Ok(artifact) => artifact,
            Err(CaptureError::Ended) => break Exit::EndOfStream,
            Err(e) => {
                report.capture_failures += 1;
                tracing::trace!(adapter = name, error = %e, "capture skipped");
                continue;
            }
        };

        let Some(event) = to_event(artifact) else {
            continue;
        };
        match sink.send(event).await {
            Ok(()) => report.sent += 1,
            Err(RelayError::NotConnected) => report.skipped_disconnected += 1,
            Err(e) => {
                report.skipped_disconnected += 1;
                tracing::warn!(adapter = name, error = %e, "send failed, dropping tick");
            }
        }
    };

    (report, exit)
}

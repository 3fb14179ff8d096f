//! Opening a session, the actor that runs it, and the handle that drives it.

use std::collections::HashMap;
use std::sync::Arc;

use polyroom_protocol::{
    ClientEvent, Codec, JsonCodec, RecordingId, RoomCode, ServerEvent,
    StreamKind, UserId,
};
use polyroom_relay::{
    AdapterSet, ArtifactSource, EncodedFrame, EventSink, Origin,
    RecordingRequest, RelayHandle, RelayReport, SpeechTranscript,
    save_recording, spawn_snapshots, spawn_transcripts,
};
use polyroom_state::{Participant, RoomSnapshot, RoomStore, StateDelta};
use polyroom_transport::{Connection, Connector, TransportError};
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};

use crate::outbound::Outbound;
use crate::session::StateCell;
use crate::{JoinRequest, SessionConfig, SessionError, SessionState};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Something the session owner should know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// An inbound event changed the room (or was a relay rejection).
    Delta(StateDelta),
    /// The transport dropped. No leave was sent. The session is closed.
    Disconnected { reason: String },
    /// The session closed after an explicit leave.
    Closed,
}

/// Which adapter a handle operation refers to. At most one adapter runs
/// per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterSlot {
    PrimarySnapshots,
    SecondarySnapshots,
    Transcripts,
}

// ---------------------------------------------------------------------------
// Actor commands
// ---------------------------------------------------------------------------

enum Command {
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// State shared by every clone of a handle and by the actor.
struct Shared<K, C> {
    origin: Origin,
    config: SessionConfig,
    state: Arc<StateCell>,
    outbound: Arc<Outbound<K, C>>,
    adapters: AdapterSet,
    slots: Mutex<HashMap<AdapterSlot, RelayHandle>>,
    language: watch::Sender<String>,
    updates: broadcast::Sender<SessionUpdate>,
}

// ---------------------------------------------------------------------------
// open
// ---------------------------------------------------------------------------

/// Connects to `relay_url`, joins the room, and starts the session actor.
///
/// Uses JSON on the wire. See [`open_with_codec`] to choose the codec.
///
/// # Errors
/// - [`SessionError::InvalidRequest`] before anything is sent.
/// - [`SessionError::Transport`] if connecting fails or the relay drops the
///   connection before acknowledging.
/// - [`SessionError::JoinTimeout`] if no acknowledgment arrives in
///   [`SessionConfig::join_timeout`].
/// - [`SessionError::Rejected`] if the relay answers `room-full` or `error`.
pub async fn open<N: Connector>(
    connector: &N,
    relay_url: &str,
    request: JoinRequest,
    config: SessionConfig,
) -> Result<SessionHandle<N::Connection>, SessionError> {
    open_with_codec(connector, relay_url, request, config, JsonCodec).await
}

/// [`open`] with an explicit codec.
pub async fn open_with_codec<N: Connector, C: Codec>(
    connector: &N,
    relay_url: &str,
    request: JoinRequest,
    config: SessionConfig,
    codec: C,
) -> Result<SessionHandle<N::Connection, C>, SessionError> {
    request.validate()?;

    let state = Arc::new(StateCell::new(request.room_code.clone()));
    state.advance(SessionState::Connecting)?;

    let conn = match connector.connect(relay_url).await {
        Ok(conn) => Arc::new(conn),
        Err(e) => {
            tracing::warn!(url = relay_url, error = %e, "relay connect failed");
            state.close();
            return Err(e.into());
        }
    };
    tracing::debug!(conn = %conn.id(), url = relay_url, "relay connected");

    let codec = Arc::new(codec);
    let outbound = Arc::new(Outbound::new(
        Arc::clone(&conn),
        Arc::clone(&codec),
        state.subscribe(),
    ));

    state.advance(SessionState::Joining)?;
    let join = ClientEvent::JoinRoom {
        room_code: request.room_code.clone(),
        user_id: request.user_id.clone(),
        name: request.name.clone(),
        language: request.language.clone(),
    };

    let acked = async {
        outbound.write(&join).await?;
        await_join_ack(&*conn, &*codec).await
    };
    let ack = match tokio::time::timeout(config.join_timeout, acked).await {
        Ok(Ok(ack)) => ack,
        Ok(Err(e)) => {
            abort_join(&state, &*conn).await;
            return Err(e);
        }
        Err(_) => {
            tracing::warn!(
                room = %request.room_code,
                timeout = ?config.join_timeout,
                "join not acknowledged"
            );
            abort_join(&state, &*conn).await;
            return Err(SessionError::JoinTimeout(config.join_timeout));
        }
    };

    let mut store = RoomStore::new(
        request.room_code.clone(),
        Participant::new(
            request.user_id.clone(),
            request.name.clone(),
            request.language.clone(),
        ),
    );
    store.apply(ack);
    state.advance(SessionState::Joined)?;
    tracing::info!(
        room = %store.room_code(),
        user = %request.user_id,
        participants = store.participant_count(),
        "joined room"
    );

    let origin = Origin::new(store.room_code().clone(), request.user_id.clone());
    let fetch = ClientEvent::GetRecordings {
        room_code: origin.room_code.clone(),
    };
    if let Err(e) = outbound.write(&fetch).await {
        tracing::warn!(error = %e, "recording list request failed");
    }

    let (language, _) = watch::channel(request.language.clone());
    let (updates, _) = broadcast::channel(config.update_buffer.max(1));
    let (commands_tx, commands_rx) = mpsc::channel(config.command_buffer.max(1));

    let shared = Arc::new(Shared {
        origin,
        config,
        state,
        outbound,
        adapters: AdapterSet::new(),
        slots: Mutex::new(HashMap::new()),
        language,
        updates,
    });

    let actor = SessionActor {
        shared: Arc::clone(&shared),
        conn,
        codec,
        store,
        commands: commands_rx,
        transport_closed: false,
    };
    tokio::spawn(actor.run());

    Ok(SessionHandle {
        commands: commands_tx,
        shared,
    })
}

/// Reads frames until the join is acknowledged or refused.
///
/// Other events that arrive first are dropped; the acknowledgment carries
/// the full room state.
async fn await_join_ack<K: Connection, C: Codec>(
    conn: &K,
    codec: &C,
) -> Result<ServerEvent, SessionError> {
    loop {
        let Some(frame) = conn.recv().await? else {
            return Err(TransportError::ConnectionClosed(
                "relay closed the connection before acknowledging join".into(),
            )
            .into());
        };
        let event: ServerEvent = match codec.decode(&frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable frame while joining");
                continue;
            }
        };
        match event {
            ServerEvent::JoinedRoom { .. } => return Ok(event),
            ServerEvent::RoomFull { .. } | ServerEvent::Error { .. } => {
                let message = event.rejection().unwrap_or_default();
                tracing::warn!(%message, "join rejected");
                return Err(SessionError::Rejected(message));
            }
            other => {
                tracing::debug!(event = other.name(), "ignoring event before join ack");
            }
        }
    }
}

async fn abort_join<K: Connection>(state: &StateCell, conn: &K) {
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "close after failed join");
    }
    state.close();
}

// ---------------------------------------------------------------------------
// SessionActor
// ---------------------------------------------------------------------------

/// Owns the store and the connection's read side.
struct SessionActor<K, C> {
    shared: Arc<Shared<K, C>>,
    conn: Arc<K>,
    codec: Arc<C>,
    store: RoomStore,
    commands: mpsc::Receiver<Command>,
    transport_closed: bool,
}

impl<K: Connection, C: Codec> SessionActor<K, C> {
    async fn run(mut self) {
        let room = self.shared.origin.room_code.clone();
        tracing::info!(%room, "session actor started");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Snapshot { reply }) => {
                        let _ = reply.send(self.store.snapshot());
                    }
                    Some(Command::Close { reply }) => {
                        self.leave().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        // Every handle is gone; nobody can close explicitly.
                        self.leave().await;
                        break;
                    }
                },
                frame = self.conn.recv() => match frame {
                    Ok(Some(bytes)) => self.on_frame(&bytes),
                    Ok(None) => {
                        self.on_transport_lost("relay closed the connection".into()).await;
                        break;
                    }
                    Err(e) => {
                        self.on_transport_lost(e.to_string()).await;
                        break;
                    }
                },
            }
        }

        tracing::info!(%room, "session actor stopped");
    }

    fn on_frame(&mut self, bytes: &[u8]) {
        let event: ServerEvent = match self.codec.decode(bytes) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable frame");
                return;
            }
        };
        let name = event.name();
        let delta = self.store.apply(event);
        tracing::trace!(event = name, ?delta, "event applied");
        if !delta.is_unchanged() {
            let _ = self.shared.updates.send(SessionUpdate::Delta(delta));
        }
    }

    /// Explicit close: stop adapters while still joined (so a live
    /// secondary stream announces its stop), then leave, then close.
    async fn leave(&mut self) {
        tracing::debug!(
            room = %self.shared.origin.room_code,
            adapters = self.shared.adapters.active(),
            "leaving room"
        );
        self.shared.adapters.shutdown().await;

        if self.shared.state.advance(SessionState::Leaving).is_ok() {
            let leave = ClientEvent::LeaveRoom {
                room_code: self.shared.origin.room_code.clone(),
                user_id: self.shared.origin.user_id.clone(),
            };
            if let Err(e) = self.shared.outbound.write(&leave).await {
                tracing::warn!(error = %e, "leave-room not delivered");
            }
        }

        self.close_transport().await;
        self.shared.state.close();
        let _ = self.shared.updates.send(SessionUpdate::Closed);
    }

    /// Transport loss: no leave, adapters see a closed session and exit.
    async fn on_transport_lost(&mut self, reason: String) {
        tracing::warn!(
            room = %self.shared.origin.room_code,
            %reason,
            adapters = self.shared.adapters.active(),
            "transport lost"
        );
        self.shared.state.close();
        self.shared.adapters.shutdown().await;
        self.close_transport().await;
        let _ = self
            .shared
            .updates
            .send(SessionUpdate::Disconnected { reason });
    }

    async fn close_transport(&mut self) {
        if std::mem::replace(&mut self.transport_closed, true) {
            return;
        }
        if let Err(e) = self.conn.close().await {
            tracing::debug!(error = %e, "transport close failed");
        }
        tracing::debug!(conn = %self.conn.id(), "transport closed");
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Drives a joined session. Cheap to clone.
///
/// Dropping every clone closes the session as if [`close`](Self::close)
/// had been called.
pub struct SessionHandle<K, C = JsonCodec> {
    commands: mpsc::Sender<Command>,
    shared: Arc<Shared<K, C>>,
}

impl<K, C> std::fmt::Debug for SessionHandle<K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

impl<K, C> Clone for SessionHandle<K, C> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K: Connection, C: Codec> SessionHandle<K, C> {
    pub fn state(&self) -> SessionState {
        self.shared.state.get()
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.shared.origin.room_code
    }

    pub fn local_user(&self) -> &UserId {
        &self.shared.origin.user_id
    }

    /// The local participant's current language.
    pub fn language(&self) -> String {
        self.shared.language.borrow().clone()
    }

    /// Subscribes to deltas and lifecycle updates from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.shared.updates.subscribe()
    }

    /// Resolves once the session reaches `Closed`.
    pub async fn closed(&self) {
        let mut rx = self.shared.state.subscribe();
        // The sender lives in `shared`, which we hold; this only ends on Closed.
        let _ = rx.wait_for(SessionState::is_closed).await;
    }

    /// Returns an owned copy of the room state.
    ///
    /// # Errors
    /// [`SessionError::Closed`] once the session has ended.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    // -----------------------------------------------------------------------
    // Outbound requests
    // -----------------------------------------------------------------------

    /// Changes the local language and sends one `update-language`.
    ///
    /// A no-op if the language is unchanged. Running transcript adapters
    /// pick up the new language on their next send.
    pub async fn set_language(
        &self,
        language: impl Into<String>,
    ) -> Result<(), SessionError> {
        let language = language.into();
        if language.trim().is_empty() {
            return Err(SessionError::InvalidRequest("language is empty".into()));
        }
        if *self.shared.language.borrow() == language {
            return Ok(());
        }
        self.ensure_joined()?;

        let event = ClientEvent::UpdateLanguage {
            room_code: self.shared.origin.room_code.clone(),
            user_id: self.shared.origin.user_id.clone(),
            language: language.clone(),
        };
        self.shared.outbound.send(event).await?;
        self.shared.language.send_replace(language);
        Ok(())
    }

    /// Uploads a recording. Validation failures send nothing.
    pub async fn save_recording(
        &self,
        request: RecordingRequest,
    ) -> Result<(), SessionError> {
        save_recording(&*self.shared.outbound, &self.shared.origin, request).await?;
        Ok(())
    }

    /// Asks the relay for the room's recordings again.
    pub async fn request_recordings(&self) -> Result<(), SessionError> {
        let event = ClientEvent::GetRecordings {
            room_code: self.shared.origin.room_code.clone(),
        };
        self.shared.outbound.send(event).await?;
        Ok(())
    }

    /// Asks the relay to translate an existing recording.
    pub async fn translate_recording(
        &self,
        recording_id: RecordingId,
        original_text: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Result<(), SessionError> {
        let event = ClientEvent::TranslateRecording {
            recording_id,
            original_text: original_text.into(),
            target_language: target_language.into(),
        };
        self.shared.outbound.send(event).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Adapters
    // -----------------------------------------------------------------------

    /// Starts sending camera frames. Replaces a running primary adapter.
    pub async fn start_primary_snapshots<Src>(
        &self,
        source: Src,
    ) -> Result<(), SessionError>
    where
        Src: ArtifactSource<Artifact = EncodedFrame>,
    {
        self.start_snapshots(AdapterSlot::PrimarySnapshots, StreamKind::Primary, source)
            .await
    }

    /// Starts sending screen-share frames. Replaces a running secondary
    /// adapter, which announces its stop first.
    pub async fn start_secondary_snapshots<Src>(
        &self,
        source: Src,
    ) -> Result<(), SessionError>
    where
        Src: ArtifactSource<Artifact = EncodedFrame>,
    {
        self.start_snapshots(
            AdapterSlot::SecondarySnapshots,
            StreamKind::Secondary,
            source,
        )
        .await
    }

    /// Starts sending final transcripts for translation.
    pub async fn start_transcripts<Src>(&self, source: Src) -> Result<(), SessionError>
    where
        Src: ArtifactSource<Artifact = SpeechTranscript>,
    {
        self.ensure_joined()?;
        let shared = &self.shared;
        let handle = spawn_transcripts(
            &shared.adapters,
            shared.origin.clone(),
            shared.config.transcript_cadence.clone(),
            source,
            Arc::clone(&shared.outbound),
            shared.language.subscribe(),
        );
        self.install(AdapterSlot::Transcripts, handle).await;
        Ok(())
    }

    /// Stops the adapter in `slot`, returning its report if one was running.
    pub async fn stop_adapter(&self, slot: AdapterSlot) -> Option<RelayReport> {
        let handle = self.shared.slots.lock().await.remove(&slot)?;
        Some(handle.stop().await)
    }

    async fn start_snapshots<Src>(
        &self,
        slot: AdapterSlot,
        kind: StreamKind,
        source: Src,
    ) -> Result<(), SessionError>
    where
        Src: ArtifactSource<Artifact = EncodedFrame>,
    {
        self.ensure_joined()?;
        let shared = &self.shared;
        let handle = spawn_snapshots(
            &shared.adapters,
            kind,
            shared.origin.clone(),
            shared.config.snapshot_cadence.clone(),
            source,
            Arc::clone(&shared.outbound),
        );
        self.install(slot, handle).await;
        Ok(())
    }

    async fn install(&self, slot: AdapterSlot, handle: RelayHandle) {
        let previous = self.shared.slots.lock().await.insert(slot, handle);
        if let Some(previous) = previous {
            let report = previous.stop().await;
            tracing::debug!(?slot, sent = report.sent, "replaced adapter");
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Leaves the room and closes the transport.
    ///
    /// Stops every adapter, sends one `leave-room`, and closes the
    /// connection once. Later and concurrent calls return once the first
    /// has finished and do nothing themselves.
    pub async fn close(&self) {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Close { reply }).await.is_err() {
            return;
        }
        let _ = rx.await;
        self.closed().await;
    }

    fn ensure_joined(&self) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Joined => Ok(()),
            SessionState::Closed => Err(SessionError::Closed),
            other => Err(SessionError::NotJoined(other)),
        }
    }
}

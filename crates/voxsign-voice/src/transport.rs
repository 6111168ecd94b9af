use crate::error::VoiceError;
use crate::media::MediaBackend;
use crate::protocol::{decode_server_event, ClientEvent, ResponseConfig, SessionConfig, TransportEvent};
use crate::signaling::SignalingClient;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;
use voxsign_types::Locale;

/// Label of the ordered event channel opened alongside the audio tracks.
pub const EVENT_CHANNEL_LABEL: &str = "oai-events";

/// Error code reported when the event channel closes underneath a live session.
pub const CHANNEL_CLOSED_CODE: &str = "channel_closed";

/// Lifecycle of a [`RealtimeTransport`]. Replaces ad-hoc "is connecting" and
/// "is tearing down" flags: `connect` is only accepted from `Idle`, and
/// `teardown` is a no-op unless the transport holds resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportLifecycle {
    Idle,
    Connecting,
    Connected,
    TearingDown,
}

/// One bidirectional speech session as seen by the turn controller.
#[async_trait]
pub trait SessionTransport: Send {
    /// Establishes the session. On failure every partially acquired resource
    /// is released before returning.
    async fn connect(&mut self) -> Result<(), VoiceError>;

    /// Sends one control event. Fails with [`VoiceError::ChannelClosed`] when
    /// the event channel is not open.
    async fn send(&mut self, event: ClientEvent) -> Result<(), VoiceError>;

    /// Attempts to start remote audio playback after a user gesture.
    async fn unlock_playback(&mut self) -> Result<(), VoiceError>;

    /// Releases all resources. Idempotent.
    async fn teardown(&mut self);

    /// Hands out the inbound event stream. Returns `None` once taken.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>>;

    async fn send_instruction(&mut self, session: SessionConfig) -> Result<(), VoiceError> {
        self.send(ClientEvent::SessionUpdate { session }).await
    }

    async fn request_response(&mut self, response: Option<ResponseConfig>) -> Result<(), VoiceError> {
        self.send(ClientEvent::ResponseCreate { response }).await
    }

    async fn cancel_response(&mut self) -> Result<(), VoiceError> {
        self.send(ClientEvent::ResponseCancel).await
    }

    async fn clear_captured_audio(&mut self) -> Result<(), VoiceError> {
        self.send(ClientEvent::InputAudioBufferClear).await
    }

    async fn commit_captured_audio(&mut self) -> Result<(), VoiceError> {
        self.send(ClientEvent::InputAudioBufferCommit).await
    }
}

/// [`SessionTransport`] over a platform [`MediaBackend`], negotiated through
/// the signaling endpoint.
pub struct RealtimeTransport<M: MediaBackend> {
    media: M,
    signaling: SignalingClient,
    locale: Locale,
    session_id: Uuid,
    lifecycle: TransportLifecycle,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    pump: Option<JoinHandle<()>>,
}

impl<M: MediaBackend> RealtimeTransport<M> {
    pub fn new(media: M, signaling: SignalingClient, locale: Locale) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            media,
            signaling,
            locale,
            session_id: Uuid::new_v4(),
            lifecycle: TransportLifecycle::Idle,
            events_tx,
            events_rx: Some(events_rx),
            pump: None,
        }
    }

    pub fn lifecycle(&self) -> TransportLifecycle {
        self.lifecycle
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    async fn establish(&mut self) -> Result<(), VoiceError> {
        self.media.acquire_microphone().await?;
        self.media.open_peer_connection().await?;
        self.media.attach_microphone().await?;

        let inbound = self.media.open_event_channel(EVENT_CHANNEL_LABEL).await?;
        self.pump = Some(spawn_pump(inbound, self.events_tx.clone(), self.session_id));

        let offer = self.media.create_offer().await?;
        let answer = self.signaling.exchange(&offer, self.locale).await?;
        self.media.apply_answer(&answer).await?;

        self.start_playback().await;
        Ok(())
    }

    /// Playback refusal is reported as an event, not a connect failure.
    async fn start_playback(&mut self) {
        match self.media.start_playback().await {
            Ok(()) => {}
            Err(VoiceError::PlaybackBlocked) => {
                info!(session = %self.session_id, "remote playback blocked until user gesture");
                let _ = self.events_tx.send(TransportEvent::PlaybackBlocked);
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "failed to start remote playback");
            }
        }
    }

    fn stop_pump(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

fn spawn_pump(
    mut inbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
    session_id: Uuid,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(raw) = inbound.recv().await {
            if let Some(event) = decode_server_event(&raw) {
                if events.send(event).is_err() {
                    return;
                }
            }
        }
        // Teardown aborts this task before closing the channel, so reaching
        // here means the remote side went away.
        warn!(session = %session_id, "event channel closed unexpectedly");
        let _ = events.send(TransportEvent::TransportError {
            code: Some(CHANNEL_CLOSED_CODE.to_string()),
            message: "event channel closed".to_string(),
        });
    })
}

#[async_trait]
impl<M: MediaBackend> SessionTransport for RealtimeTransport<M> {
    async fn connect(&mut self) -> Result<(), VoiceError> {
        match self.lifecycle {
            TransportLifecycle::Idle => {}
            TransportLifecycle::Connected => return Ok(()),
            TransportLifecycle::Connecting => return Err(VoiceError::Busy("connect already in progress")),
            TransportLifecycle::TearingDown => return Err(VoiceError::Busy("teardown in progress")),
        }

        self.lifecycle = TransportLifecycle::Connecting;
        info!(session = %self.session_id, locale = %self.locale, "connecting realtime session");

        match self.establish().await {
            Ok(()) => {
                self.lifecycle = TransportLifecycle::Connected;
                info!(session = %self.session_id, "realtime session connected");
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "realtime session setup failed");
                self.stop_pump();
                self.media.close().await;
                self.lifecycle = TransportLifecycle::Idle;
                Err(e)
            }
        }
    }

    async fn send(&mut self, event: ClientEvent) -> Result<(), VoiceError> {
        if self.lifecycle != TransportLifecycle::Connected || !self.media.is_channel_open() {
            debug!(session = %self.session_id, kind = event.kind(), "dropping event, channel not open");
            return Err(VoiceError::ChannelClosed);
        }
        let payload = event.to_json()?;
        debug!(session = %self.session_id, kind = event.kind(), "sending event");
        self.media.send(&payload).await
    }

    async fn unlock_playback(&mut self) -> Result<(), VoiceError> {
        if self.lifecycle != TransportLifecycle::Connected {
            return Err(VoiceError::ChannelClosed);
        }
        self.media.start_playback().await
    }

    async fn teardown(&mut self) {
        if matches!(
            self.lifecycle,
            TransportLifecycle::Idle | TransportLifecycle::TearingDown
        ) && self.pump.is_none()
        {
            return;
        }
        self.lifecycle = TransportLifecycle::TearingDown;
        self.stop_pump();
        self.media.close().await;
        self.lifecycle = TransportLifecycle::Idle;
        info!(session = %self.session_id, "realtime session torn down");
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events_rx.take()
    }
}

impl<M: MediaBackend> Drop for RealtimeTransport<M> {
    fn drop(&mut self) {
        self.stop_pump();
        if self.lifecycle != TransportLifecycle::Idle {
            warn!(session = %self.session_id, "realtime session dropped without teardown, releasing media");
            self.media.release();
        }
    }
}

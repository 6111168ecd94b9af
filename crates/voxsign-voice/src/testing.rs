//! In-memory [`SessionTransport`] for tests.
//!
//! [`RecordingTransport`] records every control event it is asked to send and
//! lets the test inject inbound events through the paired [`TransportLog`].

use crate::error::VoiceError;
use crate::protocol::{ClientEvent, TransportEvent};
use crate::transport::SessionTransport;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Recorded {
    sent: Vec<ClientEvent>,
    connected: bool,
    connects: usize,
    teardowns: usize,
    teardown_calls: usize,
    playback_unlocks: usize,
    fail_next_connect: Option<String>,
}

pub struct RecordingTransport {
    shared: Arc<Mutex<Recorded>>,
    events_rx: Option<mpsc::UnboundedReceiver<TransportEvent>>,
}

/// Test-side handle onto a [`RecordingTransport`].
#[derive(Clone)]
pub struct TransportLog {
    shared: Arc<Mutex<Recorded>>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl RecordingTransport {
    pub fn new() -> (Self, TransportLog) {
        let shared = Arc::new(Mutex::new(Recorded::default()));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let transport = Self {
            shared: shared.clone(),
            events_rx: Some(events_rx),
        };
        (transport, TransportLog { shared, events_tx })
    }

    fn state(&self) -> MutexGuard<'_, Recorded> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SessionTransport for RecordingTransport {
    async fn connect(&mut self) -> Result<(), VoiceError> {
        let mut state = self.state();
        state.connects += 1;
        if let Some(reason) = state.fail_next_connect.take() {
            return Err(VoiceError::Microphone(reason));
        }
        state.connected = true;
        Ok(())
    }

    async fn send(&mut self, event: ClientEvent) -> Result<(), VoiceError> {
        let mut state = self.state();
        if !state.connected {
            return Err(VoiceError::ChannelClosed);
        }
        state.sent.push(event);
        Ok(())
    }

    async fn unlock_playback(&mut self) -> Result<(), VoiceError> {
        self.state().playback_unlocks += 1;
        Ok(())
    }

    async fn teardown(&mut self) {
        let mut state = self.state();
        state.teardown_calls += 1;
        if state.connected {
            state.connected = false;
            state.teardowns += 1;
        }
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events_rx.take()
    }
}

impl TransportLog {
    fn state(&self) -> MutexGuard<'_, Recorded> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every event sent so far.
    pub fn sent(&self) -> Vec<ClientEvent> {
        self.state().sent.clone()
    }

    /// Drains the recorded events.
    pub fn take_sent(&self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.state().sent)
    }

    /// Delivers an inbound event as if the remote side had sent it.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn fail_next_connect(&self, reason: impl Into<String>) {
        self.state().fail_next_connect = Some(reason.into());
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    /// Teardowns that actually released a live session.
    pub fn teardowns(&self) -> usize {
        self.state().teardowns
    }

    /// All calls to `teardown`, including no-op repeats.
    pub fn teardown_calls(&self) -> usize {
        self.state().teardown_calls
    }

    pub fn playback_unlocks(&self) -> usize {
        self.state().playback_unlocks
    }
}

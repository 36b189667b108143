//! Test doubles for the transport engine and signaling collaborator
//!
//! Recording mocks that capture every engine and signaling interaction so
//! tests can assert on exactly what the service forwarded, and emit
//! engine events (candidates, remote channels, messages) on demand.

#![allow(dead_code)]

use async_trait::async_trait;
use peerlink::engine::{
    ChannelState, ConnectionState, DataChannelHandler, IceCandidateHandler, MessageChannel,
    MessageHandler, NegotiationNeededHandler, PeerTransport, TrackHandler, TransportEngine,
};
use peerlink::{
    DataChannelMode, Error, IceCandidate, InboundMessage, PeerConfig, Result, SessionDescription,
    Signaling,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use webrtc::track::track_local::TrackLocal;

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Signaling collaborator that records every offer and answer it is handed
#[derive(Default)]
pub struct RecordingSignaling {
    /// Recorded (peer_id, sdp) offer calls
    pub offers: Mutex<Vec<(String, String)>>,
    /// Recorded (peer_id, sdp) answer calls
    pub answers: Mutex<Vec<(String, String)>>,
}

impl RecordingSignaling {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn offer_count(&self) -> usize {
        self.offers.lock().unwrap().len()
    }

    pub fn answer_count(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

#[async_trait]
impl Signaling for RecordingSignaling {
    async fn offer(&self, peer_id: &str, sdp: &str) -> Result<()> {
        self.offers
            .lock()
            .unwrap()
            .push((peer_id.to_string(), sdp.to_string()));
        Ok(())
    }

    async fn answer(&self, peer_id: &str, sdp: &str) -> Result<()> {
        self.answers
            .lock()
            .unwrap()
            .push((peer_id.to_string(), sdp.to_string()));
        Ok(())
    }
}

/// Engine that hands out a shared [`MockPeer`]
pub struct MockEngine {
    peer: Arc<MockPeer>,
    fail_create: AtomicBool,
}

impl MockEngine {
    pub fn new(peer: Arc<MockPeer>) -> Arc<Self> {
        Arc::new(Self {
            peer,
            fail_create: AtomicBool::new(false),
        })
    }

    /// Make the next `new_peer` call fail
    pub fn fail_next_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransportEngine for MockEngine {
    async fn new_peer(&self, _config: &PeerConfig) -> Result<Arc<dyn PeerTransport>> {
        if self.fail_create.swap(false, Ordering::SeqCst) {
            return Err(Error::PeerConnectionError(
                "mock engine failure".to_string(),
            ));
        }

        let peer: Arc<dyn PeerTransport> = self.peer.clone();
        Ok(peer)
    }
}

/// Peer transport double recording every call and replaying engine events
#[derive(Default)]
pub struct MockPeer {
    /// Release order across the peer and its locally created channels
    pub close_log: Arc<Mutex<Vec<String>>>,

    /// Descriptions applied via `set_local_description`
    pub local_descriptions: Mutex<Vec<SessionDescription>>,
    /// Descriptions applied via `set_remote_description`
    pub remote_descriptions: Mutex<Vec<SessionDescription>>,
    /// Candidates added via `add_ice_candidate`
    pub candidates: Mutex<Vec<IceCandidate>>,
    /// Track IDs attached via `add_track`
    pub added_tracks: Mutex<Vec<String>>,
    /// Channels created via `create_data_channel`
    pub local_channels: Mutex<Vec<Arc<MockChannel>>>,

    /// Whether `close` was called
    pub closed: AtomicBool,

    fail_create_offer: AtomicBool,
    fail_set_remote: AtomicBool,

    negotiation_handler: Mutex<Option<NegotiationNeededHandler>>,
    candidate_handler: Mutex<Option<IceCandidateHandler>>,
    track_handler: Mutex<Option<TrackHandler>>,
    channel_handler: Mutex<Option<DataChannelHandler>>,
}

impl MockPeer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `create_offer` call fail
    pub fn fail_next_offer(&self) {
        self.fail_create_offer.store(true, Ordering::SeqCst);
    }

    /// Make the next `set_remote_description` call fail
    pub fn fail_next_remote_description(&self) {
        self.fail_set_remote.store(true, Ordering::SeqCst);
    }

    /// Channel created through `create_data_channel`, by creation order
    pub fn local_channel(&self, index: usize) -> Arc<MockChannel> {
        Arc::clone(&self.local_channels.lock().unwrap()[index])
    }

    /// Fire the registered local-candidate callback
    pub async fn emit_ice_candidate(&self, candidate: IceCandidate) {
        let fut = self
            .candidate_handler
            .lock()
            .unwrap()
            .as_ref()
            .map(|handler| handler(candidate));
        if let Some(fut) = fut {
            fut.await;
        }
    }

    /// Fire the registered negotiation-needed callback
    pub async fn emit_negotiation_needed(&self) {
        let fut = self
            .negotiation_handler
            .lock()
            .unwrap()
            .as_ref()
            .map(|handler| handler());
        if let Some(fut) = fut {
            fut.await;
        }
    }

    /// Fire the registered remote-data-channel callback
    pub async fn emit_data_channel(&self, channel: Arc<dyn MessageChannel>) {
        let fut = self
            .channel_handler
            .lock()
            .unwrap()
            .as_ref()
            .map(|handler| handler(channel));
        if let Some(fut) = fut {
            fut.await;
        }
    }
}

#[async_trait]
impl PeerTransport for MockPeer {
    fn on_negotiation_needed(&self, handler: NegotiationNeededHandler) {
        *self.negotiation_handler.lock().unwrap() = Some(handler);
    }

    fn on_ice_candidate(&self, handler: IceCandidateHandler) {
        *self.candidate_handler.lock().unwrap() = Some(handler);
    }

    fn on_track(&self, handler: TrackHandler) {
        *self.track_handler.lock().unwrap() = Some(handler);
    }

    fn on_data_channel(&self, handler: DataChannelHandler) {
        *self.channel_handler.lock().unwrap() = Some(handler);
    }

    async fn create_data_channel(
        &self,
        label: &str,
        _mode: DataChannelMode,
    ) -> Result<Arc<dyn MessageChannel>> {
        let channel = Arc::new(MockChannel::with_close_log(
            label,
            Arc::clone(&self.close_log),
        ));
        self.local_channels.lock().unwrap().push(Arc::clone(&channel));
        let channel: Arc<dyn MessageChannel> = channel;
        Ok(channel)
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        if self.fail_create_offer.swap(false, Ordering::SeqCst) {
            return Err(Error::SdpError("mock offer failure".to_string()));
        }
        Ok(SessionDescription::offer(
            "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n",
        ))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        Ok(SessionDescription::answer(
            "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n",
        ))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.local_descriptions.lock().unwrap().push(description);
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        if self.fail_set_remote.swap(false, Ordering::SeqCst) {
            return Err(Error::SdpError(
                "mock remote description failure".to_string(),
            ));
        }
        self.remote_descriptions.lock().unwrap().push(description);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.candidates.lock().unwrap().push(candidate);
        Ok(())
    }

    async fn add_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) -> Result<()> {
        self.added_tracks.lock().unwrap().push(track.id().to_string());
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        if self.closed.load(Ordering::SeqCst) {
            ConnectionState::Closed
        } else {
            ConnectionState::New
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.close_log.lock().unwrap().push("connection".to_string());
        Ok(())
    }
}

/// Data channel double with a settable readiness state
pub struct MockChannel {
    label: String,
    state: Mutex<ChannelState>,
    /// Text payloads handed to `send_text`
    pub sent: Mutex<Vec<String>>,
    /// Whether `close` was called
    pub closed: AtomicBool,
    close_log: Arc<Mutex<Vec<String>>>,
    handler: Mutex<Option<MessageHandler>>,
}

impl MockChannel {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(Self::with_close_log(label, Arc::default()))
    }

    fn with_close_log(label: &str, close_log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label: label.to_string(),
            state: Mutex::new(ChannelState::Connecting),
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            close_log,
            handler: Mutex::new(None),
        }
    }

    pub fn set_ready_state(&self, state: ChannelState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Fire the registered message callback
    pub async fn emit_message(&self, message: InboundMessage) {
        let fut = self
            .handler
            .lock()
            .unwrap()
            .as_ref()
            .map(|handler| handler(message));
        if let Some(fut) = fut {
            fut.await;
        }
    }
}

#[async_trait]
impl MessageChannel for MockChannel {
    fn label(&self) -> &str {
        &self.label
    }

    fn ready_state(&self) -> ChannelState {
        *self.state.lock().unwrap()
    }

    fn on_message(&self, handler: MessageHandler) {
        *self.handler.lock().unwrap() = Some(handler);
    }

    async fn send_text(&self, text: String) -> Result<()> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        *self.state.lock().unwrap() = ChannelState::Closed;
        self.close_log
            .lock()
            .unwrap()
            .push(format!("channel:{}", self.label));
        Ok(())
    }
}

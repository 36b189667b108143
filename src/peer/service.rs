//! Peer connection service
//!
//! Coordinates a single peer connection: creates and tears down the
//! transport, wires engine callbacks into broadcast streams, and drives
//! the offer/answer/ICE exchange against the signaling collaborator.

use crate::config::PeerConfig;
use crate::engine::{
    ChannelState, MessageChannel, PeerTransport, TransportEngine,
};
use crate::protocol::{IceCandidate, InboundMessage, SessionDescription};
use crate::signaling::Signaling;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Capacity of each broadcast event stream
const EVENT_STREAM_CAPACITY: usize = 64;

type ConnectionTx = Arc<watch::Sender<Option<Arc<dyn PeerTransport>>>>;
type ChannelTx = Arc<watch::Sender<Option<Arc<dyn MessageChannel>>>>;

/// Peer connection service
///
/// Holds the current connection and data channel handles (replay-latest
/// streams: late subscribers observe the live value) and four broadcast
/// streams fed by the transport engine: negotiation needed, remote
/// tracks, local ICE candidates, and inbound messages.
///
/// All negotiation and media operations are guarded: with no live
/// connection they are silent no-ops, never errors. Failures inside an
/// asynchronous negotiation step are caught and logged; nothing is
/// retried and nothing propagates to the caller.
pub struct PeerService {
    config: PeerConfig,
    engine: Arc<dyn TransportEngine>,
    signaling: Arc<dyn Signaling>,

    connection: ConnectionTx,
    channel: ChannelTx,

    negotiation_needed: broadcast::Sender<()>,
    tracks: broadcast::Sender<Arc<TrackRemote>>,
    ice_candidates: broadcast::Sender<IceCandidate>,
    messages: broadcast::Sender<InboundMessage>,
}

impl PeerService {
    /// Create a new service over the given engine and signaling collaborator
    ///
    /// No transport exists yet; call [`create`](Self::create) to bring one up.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(
        engine: Arc<dyn TransportEngine>,
        signaling: Arc<dyn Signaling>,
        config: PeerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let (connection, _) = watch::channel(None);
        let (channel, _) = watch::channel(None);
        let (negotiation_needed, _) = broadcast::channel(EVENT_STREAM_CAPACITY);
        let (tracks, _) = broadcast::channel(EVENT_STREAM_CAPACITY);
        let (ice_candidates, _) = broadcast::channel(EVENT_STREAM_CAPACITY);
        let (messages, _) = broadcast::channel(EVENT_STREAM_CAPACITY);

        Ok(Self {
            config,
            engine,
            signaling,
            connection: Arc::new(connection),
            channel: Arc::new(channel),
            negotiation_needed,
            tracks,
            ice_candidates,
            messages,
        })
    }

    /// Current-connection stream (replays the latest value to new subscribers)
    pub fn connection(&self) -> watch::Receiver<Option<Arc<dyn PeerTransport>>> {
        self.connection.subscribe()
    }

    /// Current-channel stream (replays the latest value to new subscribers)
    pub fn channel(&self) -> watch::Receiver<Option<Arc<dyn MessageChannel>>> {
        self.channel.subscribe()
    }

    /// Stream of negotiation-needed events
    pub fn negotiation_needed(&self) -> broadcast::Receiver<()> {
        self.negotiation_needed.subscribe()
    }

    /// Stream of remote media tracks
    pub fn tracks(&self) -> broadcast::Receiver<Arc<TrackRemote>> {
        self.tracks.subscribe()
    }

    /// Stream of locally discovered ICE candidates
    pub fn ice_candidates(&self) -> broadcast::Receiver<IceCandidate> {
        self.ice_candidates.subscribe()
    }

    /// Stream of messages received on the tracked data channel
    pub fn messages(&self) -> broadcast::Receiver<InboundMessage> {
        self.messages.subscribe()
    }

    /// Instantiate the transport and publish the connection and channel handles
    ///
    /// Registers the engine callbacks (remote track, local ICE candidate,
    /// negotiation needed, remote data channel), publishes the connection
    /// handle, then creates the local data channel and publishes it.
    ///
    /// Calling this while a connection is live replaces the previous
    /// instance without closing it; call [`close`](Self::close) first.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to instantiate the transport
    /// or the local data channel.
    pub async fn create(&self) -> Result<()> {
        if self.connection.borrow().is_some() {
            warn!("create() while a connection is live, previous instance is replaced unclosed");
        }

        let peer = self.engine.new_peer(&self.config).await?;

        let tracks = self.tracks.clone();
        peer.on_track(Box::new(move |track| {
            let tracks = tracks.clone();
            Box::pin(async move {
                let _ = tracks.send(track);
            })
        }));

        let ice_candidates = self.ice_candidates.clone();
        peer.on_ice_candidate(Box::new(move |candidate| {
            let ice_candidates = ice_candidates.clone();
            Box::pin(async move {
                let _ = ice_candidates.send(candidate);
            })
        }));

        let negotiation_needed = self.negotiation_needed.clone();
        peer.on_negotiation_needed(Box::new(move || {
            let negotiation_needed = negotiation_needed.clone();
            Box::pin(async move {
                let _ = negotiation_needed.send(());
            })
        }));

        // A channel opened by the remote peer replaces the tracked one
        let channel_tx = Arc::clone(&self.channel);
        let messages = self.messages.clone();
        peer.on_data_channel(Box::new(move |incoming| {
            let channel_tx = Arc::clone(&channel_tx);
            let messages = messages.clone();
            Box::pin(async move {
                debug!(label = incoming.label(), "remote data channel received");
                Self::forward_messages(&channel_tx, &messages, &incoming);
                channel_tx.send_replace(Some(incoming));
            })
        }));

        self.connection.send_replace(Some(Arc::clone(&peer)));

        let channel = peer
            .create_data_channel(&self.config.channel_label, self.config.data_channel_mode)
            .await?;
        Self::forward_messages(&self.channel, &self.messages, &channel);
        self.channel.send_replace(Some(channel));

        info!(label = %self.config.channel_label, "peer connection created");

        Ok(())
    }

    /// Release the channel and connection and publish absent handles
    ///
    /// The channel is released and republished first so no message
    /// callback fires against a half-closed connection. Safe to call when
    /// nothing is live. Release failures are logged, never surfaced.
    pub async fn close(&self) {
        let channel = self.channel.borrow().clone();
        if let Some(channel) = channel {
            if let Err(e) = channel.close().await {
                warn!(error = %e, "failed to close data channel");
            }
        }

        let connection = self.connection.borrow().clone();
        if let Some(connection) = connection {
            if let Err(e) = connection.close().await {
                warn!(error = %e, "failed to close peer connection");
            }
        }

        self.channel.send_replace(None);
        self.connection.send_replace(None);

        info!("peer connection closed");
    }

    /// Create an offer, set it locally, and push it to the signaling collaborator
    ///
    /// Fire-and-forget: failures at any step are logged and swallowed,
    /// and nothing is retried. No-op when no connection is live.
    pub async fn send_offer(&self, peer_id: &str) {
        let Some(peer) = self.current_connection() else {
            debug!("send_offer ignored, no live connection");
            return;
        };

        let description = match peer.create_offer().await {
            Ok(description) => description,
            Err(e) => {
                warn!(peer_id, error = %e, "failed to create offer");
                return;
            }
        };

        if let Err(e) = peer.set_local_description(description.clone()).await {
            warn!(peer_id, error = %e, "failed to set local offer");
            return;
        }

        if let Err(e) = self.signaling.offer(peer_id, &description.sdp).await {
            warn!(peer_id, error = %e, "failed to push offer to signaling");
        }
    }

    /// Create an answer, set it locally, and push it to the signaling collaborator
    ///
    /// Invoked internally as the terminal step of remote-offer handling;
    /// same fire-and-forget contract as [`send_offer`](Self::send_offer).
    pub async fn send_answer(&self, peer_id: &str) {
        let Some(peer) = self.current_connection() else {
            debug!("send_answer ignored, no live connection");
            return;
        };

        let description = match peer.create_answer().await {
            Ok(description) => description,
            Err(e) => {
                warn!(peer_id, error = %e, "failed to create answer");
                return;
            }
        };

        if let Err(e) = peer.set_local_description(description.clone()).await {
            warn!(peer_id, error = %e, "failed to set local answer");
            return;
        }

        if let Err(e) = self.signaling.answer(peer_id, &description.sdp).await {
            warn!(peer_id, error = %e, "failed to push answer to signaling");
        }
    }

    /// Apply a remote offer and respond with an answer
    ///
    /// Sets the remote description reconstructed from `sdp`; on success
    /// sends an answer back to `peer_id`. No-op when no connection is live.
    pub async fn on_offer_received(&self, peer_id: &str, sdp: &str) {
        let Some(peer) = self.current_connection() else {
            debug!("on_offer_received ignored, no live connection");
            return;
        };

        match peer
            .set_remote_description(SessionDescription::offer(sdp))
            .await
        {
            Ok(()) => self.send_answer(peer_id).await,
            Err(e) => warn!(peer_id, error = %e, "failed to apply remote offer"),
        }
    }

    /// Apply a remote answer
    ///
    /// Terminal step of the initiator half; no further message is sent.
    /// No-op when no connection is live.
    pub async fn on_answer_received(&self, sdp: &str) {
        let Some(peer) = self.current_connection() else {
            debug!("on_answer_received ignored, no live connection");
            return;
        };

        match peer
            .set_remote_description(SessionDescription::answer(sdp))
            .await
        {
            Ok(()) => {
                debug!(state = ?peer.connection_state(), "remote answer applied");
            }
            Err(e) => warn!(error = %e, "failed to apply remote answer"),
        }
    }

    /// Add a remote ICE candidate to the connection's candidate pool
    ///
    /// Valid at any point after the connection exists, before or after
    /// the SDP exchange completes (trickle ICE); the engine buffers
    /// early candidates. No-op when no connection is live.
    pub async fn on_ice_candidate_received(
        &self,
        sdp_mid: Option<String>,
        sdp_mline_index: Option<u16>,
        sdp: &str,
    ) {
        let Some(peer) = self.current_connection() else {
            debug!("on_ice_candidate_received ignored, no live connection");
            return;
        };

        let candidate = IceCandidate {
            sdp_mid,
            sdp_mline_index,
            sdp: sdp.to_string(),
        };

        if let Err(e) = peer.add_ice_candidate(candidate).await {
            warn!(error = %e, "failed to add remote ICE candidate");
        }
    }

    /// Attach a local track for outbound transmission
    ///
    /// Stream grouping rides on the track's own `stream_id`. No-op when
    /// no connection is live.
    pub async fn add_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) {
        let Some(peer) = self.current_connection() else {
            debug!("add_track ignored, no live connection");
            return;
        };

        if let Err(e) = peer.add_track(track).await {
            warn!(error = %e, "failed to add outbound track");
        }
    }

    /// Serialize `payload` to JSON text and send it over the data channel
    ///
    /// Silently dropped unless the tracked channel exists and is open;
    /// no queuing, no delivery guarantee beyond the channel's mode.
    pub async fn send_message<T: Serialize + ?Sized>(&self, payload: &T) {
        let channel = self.channel.borrow().clone();
        let Some(channel) = channel else {
            debug!("send_message dropped, no data channel");
            return;
        };

        let state = channel.ready_state();
        if state != ChannelState::Open {
            debug!(state = ?state, "send_message dropped, channel not open");
            return;
        }

        let text = match serde_json::to_string(payload) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to serialize outbound message");
                return;
            }
        };

        if let Err(e) = channel.send_text(text).await {
            warn!(error = %e, "failed to send message");
        }
    }

    fn current_connection(&self) -> Option<Arc<dyn PeerTransport>> {
        self.connection.borrow().clone()
    }

    /// Forward a channel's messages into the shared stream
    ///
    /// Forwarding is gated on the channel still being the tracked one, so
    /// a replaced channel's callback goes quiet instead of feeding stale
    /// messages into the stream. The callback holds only a weak reference
    /// to its channel; a released channel is not kept alive by its own
    /// forwarder.
    fn forward_messages(
        channel_tx: &ChannelTx,
        messages: &broadcast::Sender<InboundMessage>,
        channel: &Arc<dyn MessageChannel>,
    ) {
        let channel_tx = Arc::clone(channel_tx);
        let messages = messages.clone();
        let own = Arc::downgrade(channel);

        channel.on_message(Box::new(move |message| {
            let is_current = match own.upgrade() {
                Some(own) => channel_tx
                    .borrow()
                    .as_ref()
                    .is_some_and(|active| Arc::ptr_eq(active, &own)),
                None => false,
            };

            if is_current {
                let _ = messages.send(message);
            }

            Box::pin(async {})
        }));
    }
}

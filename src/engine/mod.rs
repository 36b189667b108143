//! Transport engine interface
//!
//! The engine implements the actual ICE/DTLS/SRTP peer connection and
//! data channel machinery. It is consumed here as an opaque capability
//! behind a narrow seam: description negotiation, candidate management,
//! channel and track attachment, and event registration. Its internal
//! state machines (signaling state, ICE state) are not re-modeled; only
//! the coarse connection state is readable for diagnostics.
//!
//! The production implementation is [`webrtc::WebRtcEngine`], backed by
//! the `webrtc` crate.

pub mod webrtc;

use crate::config::{DataChannelMode, PeerConfig};
use crate::protocol::{IceCandidate, InboundMessage, SessionDescription};
use crate::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use ::webrtc::track::track_local::TrackLocal;
use ::webrtc::track::track_remote::TrackRemote;

/// Callback invoked when the engine signals that (re)negotiation is required
pub type NegotiationNeededHandler = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback invoked for each locally discovered ICE candidate
pub type IceCandidateHandler = Box<dyn Fn(IceCandidate) -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback invoked when a remote media track arrives
pub type TrackHandler = Box<dyn Fn(Arc<TrackRemote>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback invoked when the remote peer opens a data channel
pub type DataChannelHandler =
    Box<dyn Fn(Arc<dyn MessageChannel>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback invoked for each message received on a data channel
pub type MessageHandler = Box<dyn Fn(InboundMessage) -> BoxFuture<'static, ()> + Send + Sync>;

/// Coarse connection state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial state, negotiation not yet started
    New,
    /// Connection negotiation in progress
    Connecting,
    /// Connection established successfully
    Connected,
    /// Connectivity lost, may recover
    Disconnected,
    /// Connection failed
    Failed,
    /// Connection closed
    Closed,
}

/// Data channel readiness state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Channel is being established
    Connecting,
    /// Channel is open and ready for messages
    Open,
    /// Channel is closing
    Closing,
    /// Channel is closed
    Closed,
}

/// Factory for peer transport instances
#[async_trait]
pub trait TransportEngine: Send + Sync {
    /// Instantiate a peer transport configured per `config`
    async fn new_peer(&self, config: &PeerConfig) -> Result<Arc<dyn PeerTransport>>;
}

/// One peer connection owned by the transport engine
///
/// Registration methods replace any previously registered handler.
/// Every negotiation step is asynchronous and fallible; the engine is
/// responsible for buffering candidates that arrive before a remote
/// description is set (trickle ICE).
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Register the negotiation-needed callback
    fn on_negotiation_needed(&self, handler: NegotiationNeededHandler);

    /// Register the local-ICE-candidate callback
    ///
    /// The end-of-gathering sentinel is not surfaced; the handler only
    /// sees concrete candidates.
    fn on_ice_candidate(&self, handler: IceCandidateHandler);

    /// Register the remote-track callback
    fn on_track(&self, handler: TrackHandler);

    /// Register the remote-data-channel callback
    fn on_data_channel(&self, handler: DataChannelHandler);

    /// Create a local data channel
    async fn create_data_channel(
        &self,
        label: &str,
        mode: DataChannelMode,
    ) -> Result<Arc<dyn MessageChannel>>;

    /// Create an offer description
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Create an answer description
    async fn create_answer(&self) -> Result<SessionDescription>;

    /// Set the local description
    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    /// Set the remote description
    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    /// Add a remote ICE candidate to the candidate pool
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Attach a local track for outbound transmission
    async fn add_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) -> Result<()>;

    /// Current coarse connection state
    fn connection_state(&self) -> ConnectionState;

    /// Close the connection and release its resources
    async fn close(&self) -> Result<()>;
}

/// A data sub-channel supporting free-form message exchange
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Channel label
    fn label(&self) -> &str;

    /// Current readiness state
    fn ready_state(&self) -> ChannelState;

    /// Register the message-received callback
    fn on_message(&self, handler: MessageHandler);

    /// Send a text payload over the channel
    async fn send_text(&self, text: String) -> Result<()>;

    /// Close the channel
    async fn close(&self) -> Result<()>;
}

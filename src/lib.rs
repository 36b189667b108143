//! Peer-to-peer connection lifecycle and negotiation driver
//!
//! This crate manages the lifecycle of a single peer-to-peer real-time
//! connection: it establishes a transport (audio/video plus a data
//! channel) between two endpoints through out-of-band signaling, then
//! exposes inbound media, inbound messages, and ICE candidates as
//! observable event streams.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Application / UI                                    │
//! │  ↓ (operations)        ↑ (handle + event streams)    │
//! │  PeerService                                         │
//! │  ├─ connection/channel handles (replay-latest)       │
//! │  ├─ event fan-out (negotiation, tracks, ICE, msgs)   │
//! │  └─ offer/answer/ICE protocol driver                 │
//! │     ↓ TransportEngine seam     ↓ Signaling seam      │
//! │  WebRtcEngine (webrtc crate)   out-of-band channel   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The transport engine (ICE/DTLS/SRTP) and the signaling channel are
//! external collaborators consumed behind narrow trait seams; this crate
//! only orchestrates calls into and out of them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use peerlink::{PeerConfig, PeerService, Signaling, WebRtcEngine};
//!
//! struct NullSignaling;
//!
//! #[async_trait::async_trait]
//! impl Signaling for NullSignaling {
//!     async fn offer(&self, _peer_id: &str, _sdp: &str) -> peerlink::Result<()> {
//!         Ok(())
//!     }
//!     async fn answer(&self, _peer_id: &str, _sdp: &str) -> peerlink::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> peerlink::Result<()> {
//! let engine = Arc::new(WebRtcEngine::new()?);
//! let service = PeerService::new(engine, Arc::new(NullSignaling), PeerConfig::default())?;
//!
//! let mut candidates = service.ice_candidates();
//! service.create().await?;
//! service.send_offer("remote-peer").await;
//!
//! while let Ok(candidate) = candidates.recv().await {
//!     // push candidate to the remote peer via signaling
//!     let _ = candidate;
//! }
//!
//! service.close().await;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

// Public modules
pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod signaling;

// Internal modules
mod peer;

// Re-exports for public API
pub use config::{DataChannelMode, MediaOffered, PeerConfig, TurnServerConfig};
pub use engine::webrtc::WebRtcEngine;
pub use engine::{ChannelState, ConnectionState, MessageChannel, PeerTransport, TransportEngine};
pub use error::{Error, Result};
pub use peer::PeerService;
pub use protocol::{IceCandidate, InboundMessage, SdpType, SessionDescription};
pub use signaling::Signaling;

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

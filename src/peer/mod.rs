//! Peer connection lifecycle and negotiation
//!
//! Owns the connection and data channel handles, fans engine events out
//! to subscribers, and drives the offer/answer/ICE exchange.

pub mod service;

pub use service::PeerService;

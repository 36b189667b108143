//! Configuration types for the peer connection service

use serde::{Deserialize, Serialize};

/// Main configuration for a peer connection
///
/// The defaults reproduce the fixed setup used before configuration was
/// made explicit: two public STUN servers, an unreliable "default" data
/// channel, and both audio and video offered for reception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    /// STUN server URLs (at least one ICE server required overall)
    pub stun_servers: Vec<String>,

    /// TURN server configurations (optional)
    pub turn_servers: Vec<TurnServerConfig>,

    /// Label of the locally created data channel
    pub channel_label: String,

    /// Data channel mode (default: Unreliable)
    pub data_channel_mode: DataChannelMode,

    /// Media kinds offered for reception
    pub media_offered: MediaOffered,
}

/// TURN server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnServerConfig {
    /// TURN server URL (turn:// or turns://)
    pub url: String,

    /// Username for TURN authentication
    pub username: String,

    /// Credential for TURN authentication
    pub credential: String,
}

/// Media kinds offered for reception when negotiating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaOffered {
    /// Offer to receive audio
    pub audio: bool,
    /// Offer to receive video
    pub video: bool,
}

/// Data channel mode
///
/// Determines the reliability of message delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataChannelMode {
    /// Reliable, ordered delivery
    Reliable,
    /// Unreliable, unordered delivery (low latency, default)
    Unreliable,
}

impl DataChannelMode {
    /// Get the ordered setting for the transport engine
    pub fn ordered(&self) -> bool {
        match self {
            DataChannelMode::Reliable => true,
            DataChannelMode::Unreliable => false,
        }
    }

    /// Get the max retransmits setting for the transport engine
    pub fn max_retransmits(&self) -> Option<u16> {
        match self {
            DataChannelMode::Reliable => None,      // Unlimited retransmits
            DataChannelMode::Unreliable => Some(0), // No retransmits
        }
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            stun_servers: vec![
                "stun:stun.stunprotocol.org:3478".to_string(),
                "stun:stun.l.google.com:19302".to_string(),
            ],
            turn_servers: Vec::new(),
            channel_label: "default".to_string(),
            data_channel_mode: DataChannelMode::Unreliable,
            media_offered: MediaOffered {
                audio: true,
                video: true,
            },
        }
    }
}

impl PeerConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no ICE server (STUN or TURN) is configured
    /// - `channel_label` is empty
    /// - a TURN server entry has an empty URL
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if self.stun_servers.is_empty() && self.turn_servers.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one ICE server is required".to_string(),
            ));
        }

        if self.channel_label.is_empty() {
            return Err(Error::InvalidConfig(
                "channel_label must not be empty".to_string(),
            ));
        }

        for turn in &self.turn_servers {
            if turn.url.is_empty() {
                return Err(Error::InvalidConfig(
                    "TURN server URL must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

//! Value types exchanged with the transport engine and the signaling
//! collaborator: session descriptions, ICE candidates, inbound messages.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Session description type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    /// An offer initiating negotiation
    Offer,
    /// An answer completing negotiation
    Answer,
}

impl SdpType {
    /// String form used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
        }
    }
}

impl std::fmt::Display for SdpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A session description: raw SDP text plus its type tag
///
/// Produced locally by the transport engine, or reconstructed from a
/// remote peer's raw SDP string plus the asserted type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Description type (offer or answer)
    #[serde(rename = "type")]
    pub kind: SdpType,

    /// Raw SDP text
    pub sdp: String,
}

impl SessionDescription {
    /// Build an offer description from raw SDP text
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    /// Build an answer description from raw SDP text
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// One ICE candidate in the wire shape used with the signaling collaborator
///
/// `sdp_mid` and `sdp_mline_index` may be absent; the engine resolves the
/// association in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    /// Media stream identification tag
    #[serde(rename = "sdpMid")]
    pub sdp_mid: Option<String>,

    /// Index of the media description the candidate belongs to
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,

    /// Candidate line
    pub sdp: String,
}

/// A message received on the data channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Message payload
    pub data: Bytes,

    /// Whether the payload was sent as text
    pub is_string: bool,
}

impl InboundMessage {
    /// Build a text message
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(text.into()),
            is_string: true,
        }
    }

    /// Get the payload as text, if it was sent as text and is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        if self.is_string {
            std::str::from_utf8(&self.data).ok()
        } else {
            None
        }
    }
}

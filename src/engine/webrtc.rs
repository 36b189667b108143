//! Production transport engine backed by the `webrtc` crate

use super::{
    ChannelState, ConnectionState, DataChannelHandler, IceCandidateHandler, MessageChannel,
    MessageHandler, NegotiationNeededHandler, PeerTransport, TrackHandler, TransportEngine,
};
use crate::config::PeerConfig;
use crate::protocol::{IceCandidate, InboundMessage, SdpType, SessionDescription};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{APIBuilder, API};
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::TrackLocal;

/// Transport engine backed by `webrtc::RTCPeerConnection`
pub struct WebRtcEngine {
    api: API,
}

impl WebRtcEngine {
    /// Create the engine with default codecs and interceptors registered
    pub fn new() -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| Error::PeerConnectionError(format!("Failed to register codecs: {}", e)))?;

        let interceptor_registry = register_default_interceptors(Default::default(), &mut media_engine)
            .map_err(|e| {
                Error::PeerConnectionError(format!("Failed to register interceptors: {}", e))
            })?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(interceptor_registry)
            .build();

        Ok(Self { api })
    }

    fn ice_servers(config: &PeerConfig) -> Vec<RTCIceServer> {
        config
            .stun_servers
            .iter()
            .map(|url| RTCIceServer {
                urls: vec![url.clone()],
                ..Default::default()
            })
            .chain(config.turn_servers.iter().map(|turn| {
                #[allow(clippy::needless_update)]
                RTCIceServer {
                    urls: vec![turn.url.clone()],
                    username: turn.username.clone(),
                    credential: turn.credential.clone(),
                    ..Default::default()
                }
            }))
            .collect()
    }
}

#[async_trait]
impl TransportEngine for WebRtcEngine {
    async fn new_peer(&self, config: &PeerConfig) -> Result<Arc<dyn PeerTransport>> {
        let connection_id = uuid::Uuid::new_v4().to_string();

        let rtc_config = RTCConfiguration {
            ice_servers: Self::ice_servers(config),
            bundle_policy: RTCBundlePolicy::MaxCompat,
            rtcp_mux_policy: RTCRtcpMuxPolicy::Negotiate,
            ..Default::default()
        };

        let pc = Arc::new(self.api.new_peer_connection(rtc_config).await.map_err(|e| {
            Error::PeerConnectionError(format!("Failed to create peer connection: {}", e))
        })?);

        // Receive-only transceivers so the offer asks for the configured media
        if config.media_offered.audio {
            pc.add_transceiver_from_kind(
                RTPCodecType::Audio,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
            .map_err(|e| {
                Error::MediaTrackError(format!("Failed to add audio transceiver: {}", e))
            })?;
        }

        if config.media_offered.video {
            pc.add_transceiver_from_kind(
                RTPCodecType::Video,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
            .map_err(|e| {
                Error::MediaTrackError(format!("Failed to add video transceiver: {}", e))
            })?;
        }

        let id = connection_id.clone();
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let id = id.clone();
            Box::pin(async move {
                debug!(connection_id = %id, state = ?state, "peer connection state changed");
            })
        }));

        info!(connection_id = %connection_id, "created peer connection");

        Ok(Arc::new(WebRtcPeer { connection_id, pc }))
    }
}

/// One `RTCPeerConnection` exposed through the [`PeerTransport`] seam
pub struct WebRtcPeer {
    connection_id: String,
    pc: Arc<RTCPeerConnection>,
}

impl WebRtcPeer {
    fn map_state(state: RTCPeerConnectionState) -> ConnectionState {
        match state {
            RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => {
                ConnectionState::New
            }
            RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
            RTCPeerConnectionState::Connected => ConnectionState::Connected,
            RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
            RTCPeerConnectionState::Failed => ConnectionState::Failed,
            RTCPeerConnectionState::Closed => ConnectionState::Closed,
        }
    }

    fn to_rtc_description(description: SessionDescription) -> Result<RTCSessionDescription> {
        match description.kind {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp),
            SdpType::Answer => RTCSessionDescription::answer(description.sdp),
        }
        .map_err(|e| Error::SdpError(format!("Failed to parse description: {}", e)))
    }
}

#[async_trait]
impl PeerTransport for WebRtcPeer {
    fn on_negotiation_needed(&self, handler: NegotiationNeededHandler) {
        self.pc.on_negotiation_needed(Box::new(move || handler()));
    }

    fn on_ice_candidate(&self, handler: IceCandidateHandler) {
        let handler = Arc::new(handler);
        self.pc
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    // None marks end of gathering; callers only see concrete candidates
                    let Some(candidate) = candidate else { return };
                    match candidate.to_json() {
                        Ok(init) => {
                            handler(IceCandidate {
                                sdp_mid: init.sdp_mid,
                                sdp_mline_index: init.sdp_mline_index,
                                sdp: init.candidate,
                            })
                            .await
                        }
                        Err(e) => warn!(error = %e, "failed to serialize local ICE candidate"),
                    }
                })
            }));
    }

    fn on_track(&self, handler: TrackHandler) {
        self.pc
            .on_track(Box::new(move |track, _receiver, _transceiver| handler(track)));
    }

    fn on_data_channel(&self, handler: DataChannelHandler) {
        self.pc.on_data_channel(Box::new(move |channel| {
            handler(Arc::new(WebRtcDataChannel { inner: channel }))
        }));
    }

    async fn create_data_channel(
        &self,
        label: &str,
        mode: crate::config::DataChannelMode,
    ) -> Result<Arc<dyn MessageChannel>> {
        let init = RTCDataChannelInit {
            ordered: Some(mode.ordered()),
            max_retransmits: mode.max_retransmits(),
            ..Default::default()
        };

        let channel = self
            .pc
            .create_data_channel(label, Some(init))
            .await
            .map_err(|e| Error::DataChannelError(format!("Failed to create data channel: {}", e)))?;

        debug!(connection_id = %self.connection_id, label, "created data channel");

        Ok(Arc::new(WebRtcDataChannel { inner: channel }))
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to create offer: {}", e)))?;

        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to create answer: {}", e)))?;

        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let description = Self::to_rtc_description(description)?;

        self.pc
            .set_local_description(description)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set local description: {}", e)))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let description = Self::to_rtc_description(description)?;

        self.pc
            .set_remote_description(description)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set remote description: {}", e)))
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.pc
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.sdp,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_mline_index,
                username_fragment: None,
            })
            .await
            .map_err(|e| Error::IceCandidateError(format!("Failed to add ICE candidate: {}", e)))
    }

    async fn add_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) -> Result<()> {
        self.pc
            .add_track(track)
            .await
            .map(|_sender| ())
            .map_err(|e| Error::MediaTrackError(format!("Failed to add track: {}", e)))
    }

    fn connection_state(&self) -> ConnectionState {
        Self::map_state(self.pc.connection_state())
    }

    async fn close(&self) -> Result<()> {
        info!(connection_id = %self.connection_id, "closing peer connection");

        self.pc
            .close()
            .await
            .map_err(|e| Error::PeerConnectionError(format!("Failed to close connection: {}", e)))
    }
}

/// One `RTCDataChannel` exposed through the [`MessageChannel`] seam
pub struct WebRtcDataChannel {
    inner: Arc<RTCDataChannel>,
}

#[async_trait]
impl MessageChannel for WebRtcDataChannel {
    fn label(&self) -> &str {
        self.inner.label()
    }

    fn ready_state(&self) -> ChannelState {
        match self.inner.ready_state() {
            RTCDataChannelState::Unspecified | RTCDataChannelState::Connecting => {
                ChannelState::Connecting
            }
            RTCDataChannelState::Open => ChannelState::Open,
            RTCDataChannelState::Closing => ChannelState::Closing,
            RTCDataChannelState::Closed => ChannelState::Closed,
        }
    }

    fn on_message(&self, handler: MessageHandler) {
        self.inner.on_message(Box::new(move |msg| {
            handler(InboundMessage {
                data: msg.data,
                is_string: msg.is_string,
            })
        }));
    }

    async fn send_text(&self, text: String) -> Result<()> {
        self.inner
            .send_text(text)
            .await
            .map(|_bytes| ())
            .map_err(|e| Error::DataChannelError(format!("Failed to send message: {}", e)))
    }

    async fn close(&self) -> Result<()> {
        self.inner
            .close()
            .await
            .map_err(|e| Error::DataChannelError(format!("Failed to close channel: {}", e)))
    }
}

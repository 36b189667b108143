//! Signaling collaborator interface
//!
//! The signaling channel carries offers, answers, and candidates
//! out-of-band between peers. Its transport (WebSocket, HTTP, ...) is
//! outside this crate; implementors push locally generated descriptions
//! to the remote peer and are expected to deliver remote descriptions
//! and candidates back through [`PeerService::on_offer_received`],
//! [`PeerService::on_answer_received`], and
//! [`PeerService::on_ice_candidate_received`].
//!
//! [`PeerService::on_offer_received`]: crate::PeerService::on_offer_received
//! [`PeerService::on_answer_received`]: crate::PeerService::on_answer_received
//! [`PeerService::on_ice_candidate_received`]: crate::PeerService::on_ice_candidate_received

use crate::Result;
use async_trait::async_trait;

/// Out-of-band signaling collaborator
#[async_trait]
pub trait Signaling: Send + Sync {
    /// Deliver a locally generated offer to the remote peer
    ///
    /// # Arguments
    ///
    /// * `peer_id` - Identifier of the remote peer
    /// * `sdp` - Raw SDP text of the offer
    async fn offer(&self, peer_id: &str, sdp: &str) -> Result<()>;

    /// Deliver a locally generated answer to the remote peer
    ///
    /// # Arguments
    ///
    /// * `peer_id` - Identifier of the remote peer
    /// * `sdp` - Raw SDP text of the answer
    async fn answer(&self, peer_id: &str, sdp: &str) -> Result<()>;
}

//! The pending-sequence table: proposals that haven't settled yet, on
//! either side of the exchange.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingStatus {
    /// We proposed; waiting for the peer's response.
    Proposed,
    /// The peer proposed and we responded; waiting for settlement.
    Responded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pending<S> {
    pub status: PendingStatus,
    /// Whether *we* are the controller for the eventual settled sequence.
    pub controller: bool,
    /// Our half of the key exchange, present once we've generated or
    /// responded with a keypair.
    pub self_public_key: Option<String>,
    /// The peer's half, present once we've received their response.
    pub peer_public_key: Option<String>,
    /// Proposal-specific payload (e.g. the required namespaces of a session
    /// proposal), opaque to the engine itself.
    pub outcome: Option<S>,
}

impl<S> Pending<S> {
    pub fn proposed(controller: bool, self_public_key: String) -> Self {
        Self {
            status: PendingStatus::Proposed,
            controller,
            self_public_key: Some(self_public_key),
            peer_public_key: None,
            outcome: None,
        }
    }

    pub fn responded(controller: bool, self_public_key: String, peer_public_key: String) -> Self {
        Self {
            status: PendingStatus::Responded,
            controller,
            self_public_key: Some(self_public_key),
            peer_public_key: Some(peer_public_key),
            outcome: None,
        }
    }
}

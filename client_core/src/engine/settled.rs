//! The settled-sequence table: pairings/sessions with an agreed symmetric
//! key and mutable state, reachable by topic.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settled<S> {
    pub self_public_key: String,
    pub peer_public_key: String,
    /// Whether *we* are the controller of this sequence (settles which side
    /// may `upgrade`/`update`/`delete`, per spec's controller-exclusivity
    /// invariant).
    pub controller: bool,
    pub state: S,
}

impl<S> Settled<S> {
    pub fn new(self_public_key: String, peer_public_key: String, controller: bool, state: S) -> Self {
        Self {
            self_public_key,
            peer_public_key,
            controller,
            state,
        }
    }
}

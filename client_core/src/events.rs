//! Typed event bus the [`crate::client::Client`] facade publishes to, so
//! callers observe pairing/session lifecycle changes and inbound requests
//! without polling. A broadcast channel in the same style as
//! `relay_client`'s `ConnectionHandler` callbacks, generalized to the wider
//! set of event kinds a pairing/session client needs beyond a raw relay
//! connection.

use {
    crate::rpc::{Reason, SessionEventRequest, SessionProposeRequest, SessionRequestRequest},
    serde_json::Value,
    tokio::sync::broadcast,
};

#[derive(Debug, Clone)]
pub enum ClientEvent {
    RelayerConnected,
    RelayerDisconnected,

    PairingProposed { topic: String, uri: String },
    PairingSettled { topic: String },
    PairingUpdated { topic: String },
    PairingUpgraded { topic: String },
    PairingDeleted { topic: String, reason: Reason },
    PairingExpired { topic: String },
    PairingNotification { topic: String, r#type: String, data: Value },

    SessionProposal { topic: String, id: u64, proposal: SessionProposeRequest },
    SessionSettled { topic: String },
    SessionUpdated { topic: String },
    SessionExtended { topic: String },
    SessionDeleted { topic: String, reason: Reason },
    SessionExpired { topic: String },
    SessionRequest { topic: String, id: u64, request: SessionRequestRequest },
    SessionEvent { topic: String, event: SessionEventRequest },

    /// A payload was received on `topic` that the engine did not recognize
    /// as one of the known pairing/session methods; surfaced rather than
    /// dropped so callers building new protocols on top can still observe
    /// it.
    UnrecognizedPayload { topic: String, payload: Value },

    Error { message: String },
}

/// Thin wrapper around a [`broadcast::Sender`], so publishing never panics
/// on a lagging or absent receiver.
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

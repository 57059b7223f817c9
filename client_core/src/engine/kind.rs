//! The two sequence kinds the engine manages, so the same lifecycle/
//! state-machine code in [`super::engine::Engine`] serves both pairings and
//! sessions.

use {
    crate::rpc::{Metadata, PairingPermissions, SettleNamespaces},
    serde::{Deserialize, Serialize},
    std::time::Duration,
};

/// Per-kind configuration and state shape. `State` is the mutable data a
/// settled sequence carries and that `upgrade`/`update` mutate in place.
pub trait SequenceKind: Send + Sync + 'static {
    type State: Clone + Send + Sync + Serialize + for<'de> Deserialize<'de> + Default + 'static;

    /// Namespace used both for persisted keys (`wc@2:client//<NAME>:...`)
    /// and the `wc_<NAME>X` JSON-RPC method family.
    const NAME: &'static str;

    /// How long a proposal may sit unanswered before it self-deletes.
    const PENDING_TTL: Duration;

    /// Default TTL applied at settlement time, absent an explicit override.
    const SETTLED_TTL: Duration;
}

/// Mutable pairing state: currently just the peer's metadata, set by
/// `approve`/`update`, and the permissions granted so far, extended only
/// monotonically by `upgrade`.
///
/// Distinct from [`crate::rpc::PairingState`], the wire shape carried by
/// `wc_pairingApprove`/`wc_pairingUpdate` requests, which has no
/// `permissions` field — permissions travel over `wc_pairingUpgrade`
/// instead and are folded into this persisted state by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PairingSequenceState {
    pub metadata: Option<Metadata>,
    pub permissions: PairingPermissions,
}

pub struct Pairing;

impl SequenceKind for Pairing {
    type State = PairingSequenceState;
    const NAME: &'static str = "pairing";
    const PENDING_TTL: Duration = Duration::from_secs(300);
    const SETTLED_TTL: Duration = Duration::from_secs(30 * 24 * 3600);
}

/// Mutable session state: the negotiated namespaces (accounts/methods/
/// events per chain namespace) and the peer's metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub namespaces: SettleNamespaces,
    pub metadata: Option<Metadata>,
}

pub struct Session;

impl SequenceKind for Session {
    type State = SessionState;
    const NAME: &'static str = "session";
    const PENDING_TTL: Duration = Duration::from_secs(300);
    const SETTLED_TTL: Duration = Duration::from_secs(7 * 24 * 3600);
}

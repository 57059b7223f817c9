//! The Sequence Engine: a single generic state machine shared by pairings
//! and sessions, parameterized over [`SequenceKind`]. Grounded on the
//! teacher's `sign_api` example (which only ever drove one session through
//! its propose/settle/update/delete calls by hand) and generalized into a
//! reusable, persisted lifecycle so the `wc_pairing*`/`wc_session*` RPC
//! handlers in [`crate::client::Client`] share one implementation of
//! propose/respond/settle/upgrade/update/delete and the TTL/tie-break rules
//! around them.

use {
    super::{
        kind::SequenceKind,
        pending::{Pending, PendingStatus},
        settled::Settled,
    },
    crate::{
        events::{ClientEvent, EventBus},
        storage::KeyValueStorage,
        subscription::{now_secs, Store, StoreError, StoreEvent},
    },
    std::{marker::PhantomData, sync::Arc},
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("NO_MATCHING_TOPIC: no pending or settled sequence on this topic")]
    NoMatchingTopic,

    #[error("MISMATCHED_TOPIC: proposed and settled topic must differ")]
    MismatchedTopic,

    #[error("UNAUTHORIZED_MATCHING_CONTROLLER: both sides claimed the controller role")]
    UnauthorizedMatchingController,

    #[error("EXPIRED: pending sequence expired before it settled")]
    Expired,

    #[error("SETTLED: sequence is already settled, cannot respond again")]
    AlreadySettled,

    #[error("RESTORE_WILL_OVERRIDE: a settled sequence already exists on this topic")]
    RestoreWillOverride,
}

/// Generic lifecycle + persistence for a pairing or session sequence.
///
/// Holds two tables, both keyed by topic: `pending` (proposed, not yet
/// settled) and `settled`. A settled sequence always lives under a topic
/// distinct from the one it was proposed on (spec's `MISMATCHED_TOPIC`
/// invariant), derived fresh from the completed key exchange.
pub struct Engine<K: SequenceKind> {
    pending: Arc<Store<Pending<K::State>>>,
    settled: Arc<Store<Settled<K::State>>>,
    events: Arc<EventBus>,
    _kind: PhantomData<K>,
}

impl<K: SequenceKind> Engine<K> {
    pub fn new(storage: Arc<dyn KeyValueStorage>, events: Arc<EventBus>) -> Self {
        Self {
            pending: Store::new(format!("wc@2:client//{}:pending", K::NAME), storage.clone()),
            settled: Store::new(format!("wc@2:client//{}:settled", K::NAME), storage),
            events,
            _kind: PhantomData,
        }
    }

    /// Loads persisted pending/settled tables and starts their TTL
    /// heartbeats. Must run once before anything else touches the engine.
    pub async fn init(&self) -> Result<(), EngineError> {
        self.pending.init().await?;
        self.settled.init().await?;
        Ok(())
    }

    /// Proposer side: registers a freshly proposed sequence under
    /// `proposed_topic`.
    pub fn propose(
        &self,
        proposed_topic: impl Into<String>,
        controller: bool,
        self_public_key: String,
    ) -> Result<(), EngineError> {
        let topic = proposed_topic.into();
        self.pending.set(
            topic,
            Pending::proposed(controller, self_public_key),
            now_secs() + K::PENDING_TTL.as_secs(),
        )?;
        Ok(())
    }

    /// Responder side: records our response to a peer's proposal, rejecting
    /// outright on a controller tie (`UNAUTHORIZED_MATCHING_CONTROLLER`):
    /// exactly one side may end up controlling the settled sequence.
    pub fn respond(
        &self,
        proposed_topic: impl Into<String>,
        our_controller: bool,
        peer_controller: bool,
        self_public_key: String,
        peer_public_key: String,
    ) -> Result<(), EngineError> {
        if our_controller == peer_controller {
            return Err(EngineError::UnauthorizedMatchingController);
        }

        let topic = proposed_topic.into();
        self.pending.set(
            topic,
            Pending::responded(our_controller, self_public_key, peer_public_key),
            now_secs() + K::PENDING_TTL.as_secs(),
        )?;
        Ok(())
    }

    /// Completes a pending sequence, moving it into the settled table under
    /// `settled_topic` (which must differ from `proposed_topic`) with an
    /// optional TTL override.
    pub fn settle(
        &self,
        proposed_topic: &str,
        settled_topic: impl Into<String>,
        peer_public_key: Option<String>,
        state: K::State,
        ttl: Option<std::time::Duration>,
    ) -> Result<(), EngineError> {
        let settled_topic = settled_topic.into();
        if settled_topic == proposed_topic {
            return Err(EngineError::MismatchedTopic);
        }

        let pending = self
            .pending
            .delete(proposed_topic)?
            .ok_or(EngineError::NoMatchingTopic)?;

        let self_public_key = pending.self_public_key.clone().unwrap_or_default();
        let peer_public_key = peer_public_key
            .or(pending.peer_public_key.clone())
            .unwrap_or_default();

        if self.settled.get(&settled_topic).is_some() {
            return Err(EngineError::RestoreWillOverride);
        }

        self.settled.set(
            settled_topic.clone(),
            Settled::new(self_public_key, peer_public_key, pending.controller, state),
            now_secs() + ttl.unwrap_or(K::SETTLED_TTL).as_secs(),
        )?;

        Ok(())
    }

    /// Rejects (deletes) a pending sequence without settling it.
    pub fn reject(&self, proposed_topic: &str) -> Result<(), EngineError> {
        self.pending
            .delete(proposed_topic)?
            .ok_or(EngineError::NoMatchingTopic)?;
        Ok(())
    }

    pub fn get_settled(&self, topic: &str) -> Option<Settled<K::State>> {
        self.settled.get(topic)
    }

    pub fn get_pending(&self, topic: &str) -> Option<Pending<K::State>> {
        self.pending.get(topic)
    }

    pub fn is_proposer(&self, proposed_topic: &str) -> bool {
        matches!(
            self.pending.get(proposed_topic),
            Some(Pending { status: PendingStatus::Proposed, .. })
        )
    }

    /// Applies `f` to the settled state for `topic`, persisting the result.
    /// Used by both `upgrade` (monotonic permission/method union) and
    /// `update` (shallow state merge) — the merge rule itself lives in the
    /// closure the caller supplies, since it differs per kind and per verb.
    pub fn mutate(
        &self,
        topic: &str,
        f: impl FnOnce(&mut K::State),
    ) -> Result<Settled<K::State>, EngineError> {
        self.settled
            .update(topic, |settled: &mut Settled<K::State>| f(&mut settled.state))?
            .ok_or(EngineError::NoMatchingTopic)
    }

    pub fn delete(&self, topic: &str) -> Result<Option<Settled<K::State>>, EngineError> {
        if let Some(settled) = self.settled.delete(topic)? {
            return Ok(Some(settled));
        }
        self.pending.delete(topic)?;
        Ok(None)
    }

    pub fn is_controller(&self, topic: &str) -> Option<bool> {
        self.settled.get(topic).map(|s| s.controller)
    }

    pub fn length(&self) -> usize {
        self.settled.length()
    }

    pub fn topics(&self) -> Vec<String> {
        self.settled.topics()
    }

    pub fn values(&self) -> Vec<Settled<K::State>> {
        self.settled.values()
    }

    /// Surfaces pending-table expiry as a generic error (the `EXPIRED`
    /// rejection spec describes for unanswered proposals — there is no
    /// settled sequence yet to name a typed event after) and settled-table
    /// expiry as `on_settled_expired`, the kind-specific lifecycle event
    /// (`PairingExpired`/`SessionExpired`). Spawns a background task; call
    /// once after [`Self::init`].
    pub fn watch_expiry(
        self: &Arc<Self>,
        emit_prefix: &'static str,
        on_settled_expired: impl Fn(String) -> ClientEvent + Send + 'static,
    ) {
        let mut pending_events = self.pending.subscribe();
        let events = self.events.clone();
        let prefix = emit_prefix;
        tokio::spawn(async move {
            while let Ok(event) = pending_events.recv().await {
                if let StoreEvent::Deleted { topic, expired: true, .. } = event {
                    events.emit(ClientEvent::Error {
                        message: format!("{prefix} proposal on {topic} expired"),
                    });
                }
            }
        });

        let mut settled_events = self.settled.subscribe();
        let events = self.events.clone();
        tokio::spawn(async move {
            while let Ok(event) = settled_events.recv().await {
                if let StoreEvent::Deleted { topic, expired: true, .. } = event {
                    events.emit(on_settled_expired(topic));
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            engine::kind::{Pairing, PairingSequenceState},
            storage::MemoryStorage,
        },
        std::time::Duration as StdDuration,
    };

    async fn test_engine() -> Arc<Engine<Pairing>> {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let engine = Arc::new(Engine::<Pairing>::new(storage, Arc::new(EventBus::default())));
        engine.init().await.unwrap();
        engine
    }

    #[tokio::test]
    async fn propose_then_settle_moves_pending_to_settled() {
        let engine = test_engine().await;
        engine.propose("proposed", true, "self-pk".to_owned()).unwrap();
        assert!(engine.is_proposer("proposed"));

        engine
            .settle("proposed", "settled", Some("peer-pk".to_owned()), PairingSequenceState::default(), None)
            .unwrap();

        assert!(engine.get_pending("proposed").is_none());
        let settled = engine.get_settled("settled").unwrap();
        assert_eq!(settled.self_public_key, "self-pk");
        assert_eq!(settled.peer_public_key, "peer-pk");
        assert!(settled.controller);
    }

    #[tokio::test]
    async fn respond_rejects_matching_controller_claim() {
        let engine = test_engine().await;
        let error = engine
            .respond("proposed", true, true, "self-pk".to_owned(), "peer-pk".to_owned())
            .unwrap_err();
        assert!(matches!(error, EngineError::UnauthorizedMatchingController));
        assert!(engine.get_pending("proposed").is_none());
    }

    #[tokio::test]
    async fn settle_rejects_same_topic_as_proposed() {
        let engine = test_engine().await;
        engine.propose("topic-a", true, "self-pk".to_owned()).unwrap();

        let error = engine
            .settle("topic-a", "topic-a", None, PairingSequenceState::default(), None)
            .unwrap_err();
        assert!(matches!(error, EngineError::MismatchedTopic));
    }

    #[tokio::test]
    async fn settle_rejects_overriding_existing_settlement() {
        let engine = test_engine().await;
        engine.propose("proposed-a", true, "self-pk".to_owned()).unwrap();
        engine
            .settle("proposed-a", "settled", None, PairingSequenceState::default(), None)
            .unwrap();

        engine.propose("proposed-b", true, "self-pk-2".to_owned()).unwrap();
        let error = engine
            .settle("proposed-b", "settled", None, PairingSequenceState::default(), None)
            .unwrap_err();
        assert!(matches!(error, EngineError::RestoreWillOverride));
    }

    #[tokio::test]
    async fn settle_without_pending_fails() {
        let engine = test_engine().await;
        let error = engine
            .settle("missing", "settled", None, PairingSequenceState::default(), None)
            .unwrap_err();
        assert!(matches!(error, EngineError::NoMatchingTopic));
    }

    #[tokio::test]
    async fn mutate_persists_changes_to_settled_state() {
        let engine = test_engine().await;
        engine.propose("proposed", true, "self-pk".to_owned()).unwrap();
        engine
            .settle("proposed", "settled", None, PairingSequenceState::default(), None)
            .unwrap();

        engine
            .mutate("settled", |state| {
                state.metadata = Some(crate::rpc::Metadata {
                    name: "wallet".to_owned(),
                    ..Default::default()
                });
            })
            .unwrap();

        let settled = engine.get_settled("settled").unwrap();
        assert_eq!(settled.state.metadata.unwrap().name, "wallet");
    }

    #[tokio::test]
    async fn delete_removes_pending_or_settled_entries() {
        let engine = test_engine().await;
        engine.propose("pending-only", true, "self-pk".to_owned()).unwrap();
        assert!(engine.delete("pending-only").unwrap().is_none());
        assert!(engine.get_pending("pending-only").is_none());

        engine.propose("proposed", true, "self-pk".to_owned()).unwrap();
        engine
            .settle("proposed", "settled", None, PairingSequenceState::default(), None)
            .unwrap();
        let removed = engine.delete("settled").unwrap();
        assert!(removed.is_some());
        assert!(engine.get_settled("settled").is_none());
    }

    #[tokio::test]
    async fn watch_expiry_emits_kind_specific_event_on_settled_expiry() {
        let engine = test_engine().await;
        engine.propose("proposed", true, "self-pk".to_owned()).unwrap();
        engine
            .settle(
                "proposed",
                "settled",
                None,
                PairingSequenceState::default(),
                Some(StdDuration::from_secs(0)),
            )
            .unwrap();

        let mut events = engine.events.subscribe();
        engine.watch_expiry("pairing", |topic| ClientEvent::PairingExpired { topic });

        tokio::time::pause();
        tokio::time::advance(StdDuration::from_secs(6)).await;
        tokio::time::resume();
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        let mut saw_expired = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, ClientEvent::PairingExpired { ref topic } if topic == "settled") {
                saw_expired = true;
            }
        }
        assert!(saw_expired);
    }
}

//! The facade tying the Crypto Controller, Subscription Store/Sequence
//! Engine, Relayer and History together into the pairing/session API
//! callers actually use, covering the propose/settle/update/delete call
//! sequence for both pairings and sessions.

use {
    crate::{
        crypto::Crypto,
        engine::{Engine, Pairing as PairingKind, PairingSequenceState, SequenceKind, Session as SessionKind, SessionState},
        error::ClientError,
        events::{ClientEvent, EventBus},
        history::History,
        pairing_uri::Pairing as PairingUri,
        relayer::{InboundPayload, Relayer},
        rpc::{
            Controller, ErrorParams, Event, JsonRpcRequest, Metadata, PairingApproveRequest, PairingDeleteRequest,
            PairingPermissions, PairingRejectRequest, PairingState as PairingWireState, PairingUpdateRequest,
            PairingUpgradeRequest, Payload, ProposeNamespaces, Proposer, Reason, Relay, RelayProtocolMetadata, Request,
            RequestParams, Response, ResponseParams, ResponseParamsError, ResponseParamsSuccess, SessionDeleteRequest,
            SessionEventRequest, SessionExtendRequest, SessionProposeRequest, SessionProposeResponse,
            SessionRequestRequest, SessionSettleRequest, SessionUpdateRequest, SettleNamespaces,
        },
        storage::KeyValueStorage,
        subscription::now_secs,
    },
    rand::{rngs::OsRng, RngCore},
    relay_client::ConnectionOptions,
    serde_json::Value,
    std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    },
    tokio::sync::{broadcast, oneshot},
};

const CALL_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RELAY: &str = "waku";

fn parse_public_key(hex_str: &str) -> Result<[u8; 32], ClientError> {
    let bytes = hex::decode(hex_str).map_err(|_| ClientError::MissingOrInvalid("public key is not valid hex"))?;
    bytes
        .try_into()
        .map_err(|_| ClientError::MissingOrInvalid("public key must be 32 bytes"))
}

fn default_relay() -> Relay {
    Relay { protocol: DEFAULT_RELAY.to_owned(), data: None }
}

/// Decodes a raw response success value into its typed shape, using the
/// original request variant (recorded in [`crate::history::History`]) to
/// know which shape to expect, since a JSON-RPC response carries no method
/// name of its own.
fn response_success_for(request: &RequestParams, value: Value) -> Result<ResponseParamsSuccess, ClientError> {
    Ok(match request {
        RequestParams::SessionPropose(_) => ResponseParamsSuccess::SessionPropose(serde_json::from_value(value)?),
        RequestParams::SessionSettle(_) => ResponseParamsSuccess::SessionSettle(serde_json::from_value(value)?),
        RequestParams::SessionUpdate(_) => ResponseParamsSuccess::SessionUpdate(serde_json::from_value(value)?),
        RequestParams::SessionExtend(_) => ResponseParamsSuccess::SessionExtend(serde_json::from_value(value)?),
        RequestParams::SessionRequest(_) => ResponseParamsSuccess::SessionRequest(serde_json::from_value(value)?),
        RequestParams::SessionEvent(_) => ResponseParamsSuccess::SessionEvent(serde_json::from_value(value)?),
        RequestParams::SessionDelete(_) => ResponseParamsSuccess::SessionDelete(serde_json::from_value(value)?),
        RequestParams::SessionPing(_) => ResponseParamsSuccess::SessionPing(serde_json::from_value(value)?),
        RequestParams::PairingApprove(_) => ResponseParamsSuccess::PairingApprove(serde_json::from_value(value)?),
        RequestParams::PairingReject(_) => ResponseParamsSuccess::PairingReject(serde_json::from_value(value)?),
        RequestParams::PairingUpdate(_) => ResponseParamsSuccess::PairingUpdate(serde_json::from_value(value)?),
        RequestParams::PairingUpgrade(_) => ResponseParamsSuccess::PairingUpgrade(serde_json::from_value(value)?),
        RequestParams::PairingDelete(_) => ResponseParamsSuccess::PairingDelete(serde_json::from_value(value)?),
        RequestParams::PairingPayload(_) => ResponseParamsSuccess::PairingPayload(value),
        RequestParams::PairingPing(_) => ResponseParamsSuccess::PairingPing(serde_json::from_value(value)?),
        RequestParams::PairingNotification(_) => ResponseParamsSuccess::PairingNotification(serde_json::from_value(value)?),
    })
}

/// Unions `additional` into `base`, per-chain-namespace set union of
/// accounts/methods/events — the monotonic rule a session upgrade applies.
fn union_namespaces(mut base: SettleNamespaces, additional: SettleNamespaces) -> SettleNamespaces {
    for (chain, namespace) in additional.0 {
        let entry = base.0.entry(chain).or_default();
        entry.accounts.extend(namespace.accounts);
        entry.methods.extend(namespace.methods);
        entry.events.extend(namespace.events);
    }
    base
}

type Storage = Arc<dyn KeyValueStorage>;

/// The top-level client: owns the Crypto Controller, Relayer, History and
/// both Sequence Engines (pairing and session), and dispatches inbound
/// wire traffic to the right one.
pub struct Client {
    metadata: Metadata,
    controller: bool,
    crypto: Arc<Crypto<Storage>>,
    relayer: Arc<Relayer<Storage>>,
    history: Arc<History<Storage>>,
    pairing: Arc<Engine<PairingKind>>,
    session: Arc<Engine<SessionKind>>,
    events: Arc<EventBus>,
    waiters: Mutex<HashMap<u64, oneshot::Sender<ResponseParams>>>,
    /// Proposer-side session topics awaiting `wc_sessionSettle`, keyed by the
    /// settled topic and pointing back at the pending entry's proposal id
    /// (the proposer's ephemeral public key).
    pending_session_topics: Mutex<HashMap<String, String>>,
}

impl Client {
    /// Builds a client. `controller` decides this client's role for
    /// pairings it proposes or responds to; sessions always make the
    /// responder (wallet) the controller, regardless of this flag.
    pub fn new(storage: Storage, metadata: Metadata, controller: bool) -> Arc<Self> {
        let events = Arc::new(EventBus::default());
        let crypto = Arc::new(Crypto::new(storage.clone()));
        let relayer = Arc::new(Relayer::new(crypto.clone(), events.clone()));
        let history = Arc::new(History::new(storage.clone()));
        let pairing = Arc::new(Engine::<PairingKind>::new(storage.clone(), events.clone()));
        let session = Arc::new(Engine::<SessionKind>::new(storage, events.clone()));

        Arc::new(Self {
            metadata,
            controller,
            crypto,
            relayer,
            history,
            pairing,
            session,
            events,
            waiters: Mutex::new(HashMap::new()),
            pending_session_topics: Mutex::new(HashMap::new()),
        })
    }

    /// Restores persisted pairing/session state and starts the inbound
    /// dispatch loop. Must be called once before anything else.
    pub async fn init(self: &Arc<Self>) -> Result<(), ClientError> {
        self.pairing.init().await?;
        self.session.init().await?;
        self.pairing.watch_expiry("pairing", |topic| ClientEvent::PairingExpired { topic });
        self.session.watch_expiry("session", |topic| ClientEvent::SessionExpired { topic });

        let mut inbound = self.relayer.subscribe_inbound();
        let client = self.clone();
        tokio::spawn(async move {
            while let Ok(InboundPayload { topic, payload }) = inbound.recv().await {
                client.handle_inbound(topic, payload).await;
            }
        });

        Ok(())
    }

    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn connect(&self, opts: ConnectionOptions) -> Result<(), ClientError> {
        Ok(self.relayer.connect(opts).await?)
    }

    pub async fn disconnect(&self) -> Result<(), ClientError> {
        Ok(self.relayer.disconnect().await?)
    }

    // ---- outbound plumbing -------------------------------------------

    /// Sends `params` on `topic` and awaits its response, decoded into the
    /// raw success `Value` (the error path is mapped into
    /// [`ClientError::Rejected`]).
    async fn call_raw(&self, topic: &str, params: RequestParams) -> Result<Value, ClientError> {
        let irn = params.irn_metadata();
        let request = Request::new(params.clone());
        let id = request.id;

        let (tx, rx) = oneshot::channel();
        self.waiters.lock().unwrap().insert(id, tx);

        let payload = serde_json::to_string(&Payload::Request(request))?;
        if let Err(error) = self.relayer.publish(topic, &payload, irn.tag, Duration::from_secs(irn.ttl)).await {
            self.waiters.lock().unwrap().remove(&id);
            return Err(error.into());
        }
        self.history.record_request(id, topic.to_owned(), params)?;

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(ResponseParams::Success(value))) => Ok(value),
            Ok(Ok(ResponseParams::Err(value))) => {
                let error: ErrorParams = serde_json::from_value(value).unwrap_or(ErrorParams { code: None, message: None });
                Err(ClientError::Rejected(error.message.unwrap_or_else(|| "request rejected".to_owned())))
            }
            Ok(Err(_)) | Err(_) => {
                self.waiters.lock().unwrap().remove(&id);
                let _ = self.history.delete(id);
                Err(ClientError::NoMatchingResponse(id))
            }
        }
    }

    /// Like [`Self::call_raw`], but decodes the success value into its typed
    /// shape based on the request variant sent.
    async fn call(&self, topic: &str, params: RequestParams) -> Result<ResponseParamsSuccess, ClientError> {
        let sent = params.clone();
        let value = self.call_raw(topic, params).await?;
        response_success_for(&sent, value)
    }

    /// Replies to an inbound request with a typed success result.
    async fn send_ack(&self, topic: &str, id: u64, success: ResponseParamsSuccess) -> Result<(), ClientError> {
        let irn = success.irn_metadata();
        let params: ResponseParams = success.try_into()?;
        let payload = serde_json::to_string(&Payload::Response(Response::new(id, params)))?;
        self.relayer.publish(topic, &payload, irn.tag, Duration::from_secs(irn.ttl)).await?;
        Ok(())
    }

    /// Replies to an inbound request with a JSON-RPC error, using `shape` to
    /// pick the right IRN response tag/ttl (its payload is discarded).
    async fn send_err(&self, topic: &str, id: u64, shape: ResponseParamsError, reason: &Reason) -> Result<(), ClientError> {
        let irn = shape.irn_metadata();
        let params = ResponseParams::Err(serde_json::to_value(ErrorParams {
            code: Some(reason.code as u64),
            message: Some(reason.message.clone()),
        })?);
        let payload = serde_json::to_string(&Payload::Response(Response::new(id, params)))?;
        self.relayer.publish(topic, &payload, irn.tag, Duration::from_secs(irn.ttl)).await?;
        Ok(())
    }

    // ---- inbound dispatch ----------------------------------------------

    async fn handle_inbound(self: &Arc<Self>, topic: String, payload: Payload) {
        let result = match payload {
            Payload::Request(request) => self.handle_request(&topic, request).await,
            Payload::Response(response) => self.handle_response(&topic, response).await,
        };
        if let Err(error) = result {
            self.events.emit(ClientEvent::Error { message: format!("error handling message on {topic}: {error}") });
        }
    }

    async fn handle_response(&self, _topic: &str, response: Response) -> Result<(), ClientError> {
        let resolved = self.history.resolve(response.id, response.params.clone());
        if let Some(tx) = self.waiters.lock().unwrap().remove(&response.id) {
            let _ = tx.send(response.params);
        }
        let _ = resolved;
        Ok(())
    }

    async fn handle_request(self: &Arc<Self>, topic: &str, request: Request) -> Result<(), ClientError> {
        let id = request.id;
        match request.params {
            RequestParams::PairingApprove(approve) => self.on_pairing_approve(topic, id, approve).await,
            RequestParams::PairingReject(reject) => self.on_pairing_reject(topic, reject).await,
            RequestParams::PairingUpdate(update) => self.on_pairing_update(topic, id, update).await,
            RequestParams::PairingUpgrade(upgrade) => self.on_pairing_upgrade(topic, id, upgrade).await,
            RequestParams::PairingDelete(delete) => self.on_pairing_delete(topic, delete).await,
            RequestParams::PairingPing(()) => self.send_ack(topic, id, ResponseParamsSuccess::PairingPing(true)).await,
            RequestParams::PairingPayload(payload) => {
                self.events.emit(ClientEvent::UnrecognizedPayload { topic: topic.to_owned(), payload });
                self.send_ack(topic, id, ResponseParamsSuccess::PairingPayload(Value::Bool(true))).await
            }
            RequestParams::PairingNotification(notification) => {
                self.events.emit(ClientEvent::PairingNotification {
                    topic: topic.to_owned(),
                    r#type: notification.r#type,
                    data: notification.data,
                });
                self.send_ack(topic, id, ResponseParamsSuccess::PairingNotification(true)).await
            }

            RequestParams::SessionPropose(proposal) => {
                self.events.emit(ClientEvent::SessionProposal { topic: topic.to_owned(), id, proposal });
                Ok(())
            }
            RequestParams::SessionSettle(settle) => self.on_session_settle(topic, id, settle).await,
            RequestParams::SessionUpdate(update) => self.on_session_update(topic, id, update).await,
            RequestParams::SessionExtend(extend) => self.on_session_extend(topic, id, extend).await,
            RequestParams::SessionRequest(request) => {
                self.events.emit(ClientEvent::SessionRequest { topic: topic.to_owned(), id, request });
                Ok(())
            }
            RequestParams::SessionEvent(event) => {
                self.events.emit(ClientEvent::SessionEvent { topic: topic.to_owned(), event });
                self.send_ack(topic, id, ResponseParamsSuccess::SessionEvent(true)).await
            }
            RequestParams::SessionDelete(delete) => self.on_session_delete(topic, delete).await,
            RequestParams::SessionPing(()) => self.send_ack(topic, id, ResponseParamsSuccess::SessionPing(true)).await,
        }
    }

    // ---- pairing lifecycle ---------------------------------------------

    /// Proposer side: generates a keypair, registers the proposal, and
    /// returns the pairing URI to hand to the peer out-of-band (QR code or
    /// deep link).
    pub async fn create_pairing(&self) -> Result<String, ClientError> {
        let public_key = self.crypto.generate_key_pair()?;
        let mut topic_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut topic_bytes);
        let topic = hex::encode(topic_bytes);

        self.relayer.subscribe(&topic).await?;
        self.pairing.propose(topic.clone(), self.controller, hex::encode(public_key))?;

        let uri = PairingUri::new(topic.clone(), self.controller, hex::encode(public_key), default_relay());
        self.events.emit(ClientEvent::PairingProposed { topic: topic.clone(), uri: uri.to_string() });
        Ok(uri.to_string())
    }

    /// Responder side: parses a pairing URI received out-of-band, completes
    /// the key exchange, settles the pairing and acks the proposer.
    pub async fn pair(&self, uri: &str) -> Result<String, ClientError> {
        let parsed: PairingUri = uri.parse()?;
        let peer_public_key = parse_public_key(&parsed.public_key)?;

        let (settled_topic, our_public_key) = self.crypto.respond_key_exchange(&peer_public_key)?;
        self.relayer.subscribe(&settled_topic).await?;

        let our_controller = !parsed.controller;
        self.pairing.respond(
            parsed.topic.clone(),
            our_controller,
            parsed.controller,
            hex::encode(our_public_key),
            parsed.public_key.clone(),
        )?;

        let state = PairingSequenceState { metadata: Some(self.metadata.clone()), ..Default::default() };
        let expiry = now_secs() + PairingKind::SETTLED_TTL.as_secs();
        self.pairing.settle(&parsed.topic, settled_topic.clone(), Some(parsed.public_key.clone()), state.clone(), None)?;

        let approve = RequestParams::PairingApprove(PairingApproveRequest {
            responder_public_key: hex::encode(our_public_key),
            expiry,
            state: PairingWireState { metadata: state.metadata },
        });
        self.call(&parsed.topic, approve).await?;

        self.events.emit(ClientEvent::PairingSettled { topic: settled_topic.clone() });
        Ok(settled_topic)
    }

    async fn on_pairing_approve(self: &Arc<Self>, topic: &str, id: u64, approve: PairingApproveRequest) -> Result<(), ClientError> {
        let pending = self.pairing.get_pending(topic).ok_or(crate::engine::EngineError::NoMatchingTopic)?;
        let our_public_key_hex = pending.self_public_key.ok_or(ClientError::MissingOrInvalid("pending pairing has no local public key"))?;
        let our_public_key = parse_public_key(&our_public_key_hex)?;
        let peer_public_key = parse_public_key(&approve.responder_public_key)?;

        let settled_topic = self.crypto.complete_key_exchange(&our_public_key, &peer_public_key)?;
        self.relayer.subscribe(&settled_topic).await?;

        let state = PairingSequenceState { metadata: approve.state.metadata, ..Default::default() };
        self.pairing.settle(
            topic,
            settled_topic.clone(),
            Some(approve.responder_public_key.clone()),
            state,
            Some(Duration::from_secs(approve.expiry.saturating_sub(now_secs()))),
        )?;

        self.send_ack(topic, id, ResponseParamsSuccess::PairingApprove(true)).await?;
        self.events.emit(ClientEvent::PairingSettled { topic: settled_topic });
        Ok(())
    }

    async fn on_pairing_reject(&self, topic: &str, reject: PairingRejectRequest) -> Result<(), ClientError> {
        self.pairing.reject(topic)?;
        self.events.emit(ClientEvent::PairingDeleted { topic: topic.to_owned(), reason: reject.reason });
        Ok(())
    }

    async fn on_pairing_update(&self, topic: &str, id: u64, update: PairingUpdateRequest) -> Result<(), ClientError> {
        self.pairing.mutate(topic, |state| state.metadata = update.state.metadata.clone())?;
        self.send_ack(topic, id, ResponseParamsSuccess::PairingUpdate(true)).await?;
        self.events.emit(ClientEvent::PairingUpdated { topic: topic.to_owned() });
        Ok(())
    }

    async fn on_pairing_upgrade(&self, topic: &str, id: u64, upgrade: PairingUpgradeRequest) -> Result<(), ClientError> {
        self.pairing.mutate(topic, |state| merge_pairing_permissions(&mut state.permissions, &upgrade.permissions))?;
        self.send_ack(topic, id, ResponseParamsSuccess::PairingUpgrade(true)).await?;
        self.events.emit(ClientEvent::PairingUpgraded { topic: topic.to_owned() });
        Ok(())
    }

    async fn on_pairing_delete(&self, topic: &str, delete: PairingDeleteRequest) -> Result<(), ClientError> {
        self.crypto.delete_sym_key(topic).ok();
        self.pairing.delete(topic)?;
        self.events.emit(ClientEvent::PairingDeleted { topic: topic.to_owned(), reason: delete.reason });
        Ok(())
    }

    /// Controller-only: grants additional JSON-RPC methods/notification
    /// types over a settled pairing. Monotonic, per spec's upgrade rule.
    pub async fn upgrade_pairing(&self, topic: &str, permissions: PairingPermissions) -> Result<(), ClientError> {
        if self.pairing.is_controller(topic) != Some(true) {
            return Err(ClientError::UnauthorizedJsonRpcMethod("wc_pairingUpgrade requires controller".to_owned()));
        }
        self.call(topic, RequestParams::PairingUpgrade(PairingUpgradeRequest { permissions: permissions.clone() })).await?;
        self.pairing.mutate(topic, |state| merge_pairing_permissions(&mut state.permissions, &permissions))?;
        self.events.emit(ClientEvent::PairingUpgraded { topic: topic.to_owned() });
        Ok(())
    }

    pub async fn update_pairing_metadata(&self, topic: &str, metadata: Metadata) -> Result<(), ClientError> {
        self.call(topic, RequestParams::PairingUpdate(PairingUpdateRequest {
            state: PairingWireState { metadata: Some(metadata.clone()) },
        }))
        .await?;
        self.pairing.mutate(topic, |state| state.metadata = Some(metadata))?;
        self.events.emit(ClientEvent::PairingUpdated { topic: topic.to_owned() });
        Ok(())
    }

    pub async fn delete_pairing(&self, topic: &str, reason: Reason) -> Result<(), ClientError> {
        let _ = self.call(topic, RequestParams::PairingDelete(PairingDeleteRequest { reason: reason.clone() })).await;
        self.crypto.delete_sym_key(topic).ok();
        self.pairing.delete(topic)?;
        self.events.emit(ClientEvent::PairingDeleted { topic: topic.to_owned(), reason });
        Ok(())
    }

    pub async fn ping_pairing(&self, topic: &str) -> Result<(), ClientError> {
        self.call(topic, RequestParams::PairingPing(())).await?;
        Ok(())
    }

    /// Forwards an opaque payload over a settled pairing topic (the
    /// `wc_pairingPayload` carrier used to piggy-back `wc_sessionPropose` and
    /// other pre-session-settlement traffic).
    pub async fn pairing_payload(&self, topic: &str, payload: Value) -> Result<Value, ClientError> {
        self.call_raw(topic, RequestParams::PairingPayload(payload)).await
    }

    // ---- session lifecycle ----------------------------------------------

    /// Proposer (dApp) side: proposes a session over a settled pairing
    /// topic, awaits the responder's (wallet's) acknowledgement, completes
    /// the key exchange, and registers the new settled topic to await the
    /// responder's `wc_sessionSettle` push.
    pub async fn propose_session(self: &Arc<Self>, pairing_topic: &str, required_namespaces: ProposeNamespaces) -> Result<String, ClientError> {
        let our_public_key = self.crypto.generate_key_pair()?;
        let proposal_id = hex::encode(our_public_key);

        // dApps never control sessions; the wallet (responder) always does.
        self.session.propose(proposal_id.clone(), false, proposal_id.clone())?;

        let params = RequestParams::SessionPropose(SessionProposeRequest {
            relays: vec![default_relay()],
            proposer: Proposer { public_key: proposal_id.clone(), metadata: self.metadata.clone() },
            required_namespaces,
        });

        let ack = match self.call(pairing_topic, params).await? {
            ResponseParamsSuccess::SessionPropose(ack) => ack,
            _ => return Err(ClientError::MissingOrInvalid("unexpected response to wc_sessionPropose")),
        };

        let peer_public_key = parse_public_key(&ack.responder_public_key)?;
        let settled_topic = self.crypto.complete_key_exchange(&our_public_key, &peer_public_key)?;
        self.relayer.subscribe(&settled_topic).await?;

        // The wallet pushes `wc_sessionSettle` over `settled_topic` next; this
        // map lets `on_session_settle` recover the pending entry keyed by
        // `proposal_id` once that arrives.
        self.pending_session_topics.lock().unwrap().insert(settled_topic.clone(), proposal_id);

        Ok(settled_topic)
    }

    /// Responder (wallet) side: approves a session proposal surfaced via
    /// [`ClientEvent::SessionProposal`], completing the key exchange and
    /// pushing `wc_sessionSettle` over the new topic.
    pub async fn approve_session(
        &self,
        id: u64,
        pairing_topic: &str,
        proposal: &SessionProposeRequest,
        namespaces: SettleNamespaces,
    ) -> Result<String, ClientError> {
        let peer_public_key = parse_public_key(&proposal.proposer.public_key)?;
        let (settled_topic, our_public_key) = self.crypto.respond_key_exchange(&peer_public_key)?;
        self.relayer.subscribe(&settled_topic).await?;

        let proposal_id = proposal.proposer.public_key.clone();
        self.session.respond(proposal_id.clone(), true, false, hex::encode(our_public_key), proposal_id.clone())?;

        let expiry = now_secs() + SessionKind::SETTLED_TTL.as_secs();
        let state = SessionState { namespaces: namespaces.clone(), metadata: Some(proposal.proposer.metadata.clone()) };
        self.session.settle(&proposal_id, settled_topic.clone(), Some(proposal_id.clone()), state, None)?;

        self.send_ack(
            pairing_topic,
            id,
            ResponseParamsSuccess::SessionPropose(SessionProposeResponse {
                relay: default_relay(),
                responder_public_key: hex::encode(our_public_key),
            }),
        )
        .await?;

        let settle = RequestParams::SessionSettle(SessionSettleRequest {
            relay: default_relay(),
            controller: Controller { public_key: hex::encode(our_public_key), metadata: self.metadata.clone() },
            namespaces,
            expiry,
        });
        self.call(&settled_topic, settle).await?;

        self.events.emit(ClientEvent::SessionSettled { topic: settled_topic.clone() });
        Ok(settled_topic)
    }

    /// Responder (wallet) side: rejects a session proposal, replying with a
    /// JSON-RPC error on the pairing topic it arrived on.
    pub async fn reject_session(&self, id: u64, pairing_topic: &str, reason: Reason) -> Result<(), ClientError> {
        let placeholder = ErrorParams { code: None, message: None };
        self.send_err(pairing_topic, id, ResponseParamsError::SessionPropose(placeholder), &reason).await
    }

    async fn on_session_settle(self: &Arc<Self>, topic: &str, id: u64, settle: SessionSettleRequest) -> Result<(), ClientError> {
        let proposal_id = self
            .pending_session_topics
            .lock()
            .unwrap()
            .remove(topic)
            .ok_or(crate::engine::EngineError::NoMatchingTopic)?;

        let state = SessionState { namespaces: settle.namespaces, metadata: Some(settle.controller.metadata) };
        self.session.settle(
            &proposal_id,
            topic.to_owned(),
            Some(settle.controller.public_key),
            state,
            Some(Duration::from_secs(settle.expiry.saturating_sub(now_secs()))),
        )?;

        self.send_ack(topic, id, ResponseParamsSuccess::SessionSettle(true)).await?;
        self.events.emit(ClientEvent::SessionSettled { topic: topic.to_owned() });
        Ok(())
    }

    async fn on_session_update(&self, topic: &str, id: u64, update: SessionUpdateRequest) -> Result<(), ClientError> {
        self.session.mutate(topic, |state| state.namespaces = update.namespaces.clone())?;
        self.send_ack(topic, id, ResponseParamsSuccess::SessionUpdate(true)).await?;
        self.events.emit(ClientEvent::SessionUpdated { topic: topic.to_owned() });
        Ok(())
    }

    async fn on_session_extend(&self, topic: &str, id: u64, _extend: SessionExtendRequest) -> Result<(), ClientError> {
        self.send_ack(topic, id, ResponseParamsSuccess::SessionExtend(true)).await?;
        self.events.emit(ClientEvent::SessionExtended { topic: topic.to_owned() });
        Ok(())
    }

    async fn on_session_delete(&self, topic: &str, delete: SessionDeleteRequest) -> Result<(), ClientError> {
        self.crypto.delete_sym_key(topic).ok();
        self.session.delete(topic)?;
        self.events.emit(ClientEvent::SessionDeleted {
            topic: topic.to_owned(),
            reason: Reason { code: delete.code, message: delete.message },
        });
        Ok(())
    }

    /// Controller-only (always the wallet): widens the session's namespaces,
    /// unioning accounts/methods/events rather than replacing them.
    pub async fn upgrade_session(&self, topic: &str, additional: SettleNamespaces) -> Result<(), ClientError> {
        if self.session.is_controller(topic) != Some(true) {
            return Err(ClientError::UnauthorizedJsonRpcMethod("wc_sessionUpdate (upgrade) requires controller".to_owned()));
        }
        let current = self.session.get_settled(topic).ok_or(crate::engine::EngineError::NoMatchingTopic)?.state.namespaces;
        self.update_session(topic, union_namespaces(current, additional)).await
    }

    /// Controller-only: replaces the session's negotiated namespaces.
    pub async fn update_session(&self, topic: &str, namespaces: SettleNamespaces) -> Result<(), ClientError> {
        self.call(topic, RequestParams::SessionUpdate(SessionUpdateRequest { namespaces: namespaces.clone() })).await?;
        self.session.mutate(topic, |state| state.namespaces = namespaces.clone())?;
        self.events.emit(ClientEvent::SessionUpdated { topic: topic.to_owned() });
        Ok(())
    }

    /// Controller-only: extends the session's TTL.
    pub async fn extend_session(&self, topic: &str, ttl: Duration) -> Result<(), ClientError> {
        if self.session.is_controller(topic) != Some(true) {
            return Err(ClientError::UnauthorizedJsonRpcMethod("wc_sessionExtend requires controller".to_owned()));
        }
        let expiry = now_secs() + ttl.as_secs();
        self.call(topic, RequestParams::SessionExtend(SessionExtendRequest { expiry })).await?;
        self.events.emit(ClientEvent::SessionExtended { topic: topic.to_owned() });
        Ok(())
    }

    pub async fn delete_session(&self, topic: &str, reason: Reason) -> Result<(), ClientError> {
        let _ = self
            .call(topic, RequestParams::SessionDelete(SessionDeleteRequest { code: reason.code, message: reason.message.clone() }))
            .await;
        self.crypto.delete_sym_key(topic).ok();
        self.session.delete(topic)?;
        self.events.emit(ClientEvent::SessionDeleted { topic: topic.to_owned(), reason });
        Ok(())
    }

    pub async fn ping_session(&self, topic: &str) -> Result<(), ClientError> {
        self.call(topic, RequestParams::SessionPing(())).await?;
        Ok(())
    }

    /// Sends a blockchain JSON-RPC request over a settled session, enforcing
    /// that `method` was granted for `chain_id` in the negotiated
    /// namespaces. Resolves with the peer's raw JSON-RPC result.
    pub async fn request(&self, topic: &str, chain_id: impl Into<String>, method: impl Into<String>, params: Value) -> Result<Value, ClientError> {
        let chain_id = chain_id.into();
        let method = method.into();

        let settled = self.session.get_settled(topic).ok_or(crate::engine::EngineError::NoMatchingTopic)?;
        let namespace = settled.state.namespaces.0.get(&chain_id).ok_or_else(|| ClientError::UnauthorizedTargetChain(chain_id.clone()))?;
        if !namespace.methods.contains(&method) {
            return Err(ClientError::UnauthorizedJsonRpcMethod(method));
        }

        self.call_raw(
            topic,
            RequestParams::SessionRequest(SessionRequestRequest { request: JsonRpcRequest { method, params, expiry: None }, chain_id }),
        )
        .await
    }

    /// Emits a session event (e.g. `accountsChanged`), enforcing that
    /// `event_name` was granted for `chain_id`.
    pub async fn notify(&self, topic: &str, chain_id: impl Into<String>, event_name: impl Into<String>, data: Value) -> Result<(), ClientError> {
        let chain_id = chain_id.into();
        let event_name = event_name.into();

        let settled = self.session.get_settled(topic).ok_or(crate::engine::EngineError::NoMatchingTopic)?;
        let namespace = settled.state.namespaces.0.get(&chain_id).ok_or_else(|| ClientError::UnauthorizedTargetChain(chain_id.clone()))?;
        if !namespace.events.contains(&event_name) {
            return Err(ClientError::UnauthorizedNotificationType(event_name));
        }

        self.call(topic, RequestParams::SessionEvent(SessionEventRequest { event: Event { name: event_name, data }, chain_id })).await?;
        Ok(())
    }
}

fn merge_pairing_permissions(state: &mut crate::rpc::PairingPermissions, upgrade: &PairingPermissions) {
    state.jsonrpc.methods.extend(upgrade.jsonrpc.methods.iter().cloned());
    match (&mut state.notifications, &upgrade.notifications) {
        (Some(existing), Some(incoming)) => existing.types.extend(incoming.types.iter().cloned()),
        (None, Some(incoming)) => state.notifications = Some(incoming.clone()),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::rpc::{JsonRpcPermissions, NotificationPermissions, SettleNamespace},
    };

    #[test]
    fn parse_public_key_accepts_32_hex_bytes() {
        let key = [7u8; 32];
        assert_eq!(parse_public_key(&hex::encode(key)).unwrap(), key);
    }

    #[test]
    fn parse_public_key_rejects_bad_hex() {
        assert!(matches!(parse_public_key("not-hex"), Err(ClientError::MissingOrInvalid(_))));
    }

    #[test]
    fn parse_public_key_rejects_wrong_length() {
        assert!(matches!(parse_public_key("aabb"), Err(ClientError::MissingOrInvalid(_))));
    }

    #[test]
    fn response_success_for_decodes_per_request_variant() {
        let decoded = response_success_for(&RequestParams::SessionPing(()), Value::Bool(true)).unwrap();
        assert!(matches!(decoded, ResponseParamsSuccess::SessionPing(true)));

        let payload = serde_json::json!({"foo": "bar"});
        let decoded = response_success_for(&RequestParams::PairingPayload(Value::Null), payload.clone()).unwrap();
        assert!(matches!(decoded, ResponseParamsSuccess::PairingPayload(v) if v == payload));
    }

    #[test]
    fn union_namespaces_merges_accounts_methods_and_events() {
        let mut base = SettleNamespaces::default();
        base.0.insert(
            "eip155:1".to_owned(),
            SettleNamespace {
                accounts: ["eip155:1:0xA".to_owned()].into_iter().collect(),
                methods: ["eth_sign".to_owned()].into_iter().collect(),
                events: ["accountsChanged".to_owned()].into_iter().collect(),
                extensions: None,
            },
        );

        let mut additional = SettleNamespaces::default();
        additional.0.insert(
            "eip155:1".to_owned(),
            SettleNamespace {
                accounts: ["eip155:1:0xB".to_owned()].into_iter().collect(),
                methods: ["eth_sendTransaction".to_owned()].into_iter().collect(),
                events: [].into_iter().collect(),
                extensions: None,
            },
        );
        additional.0.insert(
            "eip155:5".to_owned(),
            SettleNamespace {
                accounts: ["eip155:5:0xC".to_owned()].into_iter().collect(),
                methods: [].into_iter().collect(),
                events: [].into_iter().collect(),
                extensions: None,
            },
        );

        let merged = union_namespaces(base, additional);

        let eip155_1 = merged.0.get("eip155:1").unwrap();
        assert_eq!(eip155_1.accounts.len(), 2);
        assert!(eip155_1.methods.contains("eth_sign"));
        assert!(eip155_1.methods.contains("eth_sendTransaction"));
        assert!(eip155_1.events.contains("accountsChanged"));

        assert!(merged.0.contains_key("eip155:5"));
    }

    #[test]
    fn merge_pairing_permissions_is_monotonic() {
        let mut state = PairingPermissions {
            jsonrpc: JsonRpcPermissions { methods: ["wc_pairingPing".to_owned()].into_iter().collect() },
            notifications: None,
        };

        let upgrade = PairingPermissions {
            jsonrpc: JsonRpcPermissions { methods: ["wc_pairingUpdate".to_owned()].into_iter().collect() },
            notifications: Some(NotificationPermissions { types: ["chainChanged".to_owned()].into_iter().collect() }),
        };

        merge_pairing_permissions(&mut state, &upgrade);

        assert!(state.jsonrpc.methods.contains("wc_pairingPing"));
        assert!(state.jsonrpc.methods.contains("wc_pairingUpdate"));
        assert_eq!(state.notifications.unwrap().types.len(), 1);
    }
}

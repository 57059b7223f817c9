//! The Relayer: a crypto-aware wrapper over [`relay_client::Client`] that
//! encrypts outgoing payloads and decrypts inbound ones before handing them
//! off as [`ClientEvent::Message`]-equivalent engine input, turning
//! `relay_client`'s raw-bytes `Client`/`ConnectionHandler` pair into the
//! topic-addressed, encrypted pub/sub the engine expects.

use {
    crate::{
        crypto::{Crypto, CryptoError},
        events::{ClientEvent, EventBus},
        rpc::Payload,
        storage::KeyValueStorage,
    },
    relay_client::{Client as RelayClient, ConnectionHandler, ConnectionOptions, PublishedMessage},
    relay_rpc::domain::{SubscriptionId, Topic},
    std::{sync::Arc, time::Duration},
    tokio::sync::{broadcast, mpsc},
    tokio_tungstenite::tungstenite::protocol::CloseFrame,
};

#[derive(Debug, thiserror::Error)]
pub enum RelayerError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("relay request failed: {0}")]
    Relay(#[from] relay_client::Error),
}

/// A decrypted JSON-RPC payload received on a topic, handed to whatever
/// subscribes to [`Relayer::subscribe_inbound`] (the not-yet-settled
/// pairing/session engines) for method dispatch.
#[derive(Debug, Clone)]
pub struct InboundPayload {
    pub topic: String,
    pub payload: Payload,
}

struct Handler {
    inbound_tx: mpsc::UnboundedSender<PublishedMessage>,
    events: Arc<EventBus>,
}

impl ConnectionHandler for Handler {
    fn connected(&mut self) {
        self.events.emit(ClientEvent::RelayerConnected);
    }

    fn disconnected(&mut self, _frame: Option<CloseFrame<'static>>) {
        self.events.emit(ClientEvent::RelayerDisconnected);
    }

    fn message_received(&mut self, message: PublishedMessage) {
        let _ = self.inbound_tx.send(message);
    }

    fn inbound_error(&mut self, error: relay_client::Error) {
        self.events.emit(ClientEvent::Error {
            message: format!("relay inbound error: {error}"),
        });
    }

    fn outbound_error(&mut self, error: relay_client::Error) {
        self.events.emit(ClientEvent::Error {
            message: format!("relay outbound error: {error}"),
        });
    }
}

/// Crypto-aware relay transport: `publish`/`subscribe`/`unsubscribe` operate
/// on plaintext and string topics, leaving envelope encryption and topic
/// parsing to this layer.
pub struct Relayer<S> {
    client: RelayClient,
    crypto: Arc<Crypto<S>>,
    inbound: broadcast::Sender<InboundPayload>,
}

impl<S: KeyValueStorage + 'static> Relayer<S> {
    pub fn new(crypto: Arc<Crypto<S>>, events: Arc<EventBus>) -> Self {
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
        let handler = Handler {
            inbound_tx: raw_tx,
            events: events.clone(),
        };
        let client = RelayClient::new(handler);

        let (inbound, _) = broadcast::channel(256);
        let inbound_tx = inbound.clone();
        let crypto_task = crypto.clone();
        tokio::spawn(async move {
            while let Some(message) = raw_rx.recv().await {
                let topic = message.topic.to_string();
                let plaintext = match crypto_task.decrypt(&topic, &message.message) {
                    Ok(plaintext) => plaintext,
                    Err(CryptoError::KeyNotFound) => match hex::decode(message.message.as_ref()) {
                        Ok(bytes) => match String::from_utf8(bytes) {
                            Ok(plaintext) => plaintext,
                            Err(error) => {
                                events.emit(ClientEvent::Error {
                                    message: format!(
                                        "unencrypted payload on {topic} is not valid UTF-8: {error}"
                                    ),
                                });
                                continue;
                            }
                        },
                        Err(error) => {
                            events.emit(ClientEvent::Error {
                                message: format!(
                                    "unencrypted payload on {topic} is not hex-encoded: {error}"
                                ),
                            });
                            continue;
                        }
                    },
                    Err(error) => {
                        events.emit(ClientEvent::Error {
                            message: format!("failed to decrypt message on {topic}: {error}"),
                        });
                        continue;
                    }
                };

                match serde_json::from_str::<Payload>(&plaintext) {
                    Ok(payload) => {
                        let _ = inbound_tx.send(InboundPayload { topic, payload });
                    }
                    Err(_) => {
                        let payload = serde_json::from_str(&plaintext).unwrap_or_default();
                        events.emit(ClientEvent::UnrecognizedPayload { topic, payload });
                    }
                }
            }
        });

        Self {
            client,
            crypto,
            inbound,
        }
    }

    /// Subscribes to decrypted, JSON-RPC-parsed inbound payloads across all
    /// topics this relayer has received messages on.
    pub fn subscribe_inbound(&self) -> broadcast::Receiver<InboundPayload> {
        self.inbound.subscribe()
    }

    pub async fn connect(&self, opts: ConnectionOptions) -> Result<(), RelayerError> {
        Ok(self.client.connect(opts).await?)
    }

    pub async fn disconnect(&self) -> Result<(), RelayerError> {
        Ok(self.client.disconnect().await?)
    }

    /// Publishes `payload` on `topic`, encrypting it if a key is held for
    /// that topic and sending it in the clear otherwise (the case for a
    /// pairing's first proposal message).
    pub async fn publish(
        &self,
        topic: &str,
        payload: &str,
        tag: u32,
        ttl: Duration,
    ) -> Result<(), RelayerError> {
        let message = match self.crypto.encrypt(topic, payload) {
            Ok(message) => message,
            // No shared key yet (a proposal topic during the handshake):
            // hex-encode the plaintext UTF-8 rather than sending it raw.
            Err(CryptoError::KeyNotFound) => hex::encode(payload),
            Err(error) => return Err(error.into()),
        };

        let topic = Topic::from(topic.to_owned());
        self.client.publish(topic, message, tag, ttl).await?;
        Ok(())
    }

    pub async fn subscribe(&self, topic: &str) -> Result<SubscriptionId, RelayerError> {
        let topic = Topic::from(topic.to_owned());
        Ok(self.client.subscribe(topic).await?)
    }

    pub async fn unsubscribe(
        &self,
        topic: &str,
        subscription_id: SubscriptionId,
    ) -> Result<(), RelayerError> {
        let topic = Topic::from(topic.to_owned());
        self.client.unsubscribe(topic, subscription_id).await?;
        Ok(())
    }
}

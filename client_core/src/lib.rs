//! Client-side implementation of the WalletConnect v2 pairing/session
//! protocol: Crypto Controller, Subscription Store, JSON-RPC History, the
//! generic Sequence Engine shared by pairings and sessions, the relay
//! transport, and the [`client::Client`] facade tying them together.

pub mod client;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod pairing_uri;
pub mod relayer;
pub mod rpc;
pub mod storage;
pub mod subscription;

pub use {
    client::Client,
    error::ClientError,
    events::{ClientEvent, EventBus},
};

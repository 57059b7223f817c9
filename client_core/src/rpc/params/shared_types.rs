//! https://specs.walletconnect.com/2.0/specs/clients/sign/data-structures

mod propose_namespaces;
mod settle_namespaces;

use {serde::{Deserialize, Serialize}, std::collections::BTreeSet};
pub use {
    propose_namespaces::{ProposeNamespace, ProposeNamespaceError, ProposeNamespaces},
    settle_namespaces::{SettleNamespace, SettleNamespaces},
};

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
    pub name: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone, Default)]
pub struct Relay {
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub data: Option<String>,
}

/// Reason given for a rejection or a deletion, shared by pairing and session
/// `reject`/`delete` requests.
#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Reason {
    pub code: i64,
    pub message: String,
}

/// Pairing state: the only mutable piece of pairing state is the peer's
/// metadata, set once during `approve`/`update`.
#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PairingState {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// JSON-RPC method permissions granted over a pairing, extended by `upgrade`.
#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct JsonRpcPermissions {
    pub methods: BTreeSet<String>,
}

/// Notification type permissions granted over a pairing, extended by
/// `upgrade`.
#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPermissions {
    pub types: BTreeSet<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PairingPermissions {
    pub jsonrpc: JsonRpcPermissions,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub notifications: Option<NotificationPermissions>,
}

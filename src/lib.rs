//! Umbrella crate re-exporting the workspace's three layers behind matching
//! Cargo features: `relay_client`/`relay_rpc`/`client_core` gated behind
//! `client`/`rpc`/`core` respectively.

#[cfg(feature = "rpc")]
pub use relay_rpc;

#[cfg(feature = "client")]
pub use relay_client;

#[cfg(feature = "core")]
pub use client_core;

//! Simple WalletConnect v2 wallet that approves session proposals over an
//! existing pairing, to demonstrate the [`client_core::Client`] facade.
//!
//! Current capabilities:
//! - Session pairing
//! - New session establishment
//!
//! Please note that this client is for demonstration purposes only, and hence
//! it doesn't handle many things that a complete client should handle:
//! - Multiple concurrent pairings/sessions
//! - Replaying unanswered history on restart
//! - ...

use {
    anyhow::Result,
    clap::Parser,
    client_core::{client::Client, events::ClientEvent, rpc::*, storage::MemoryStorage},
    relay_client::ConnectionOptions,
    std::{collections::BTreeMap, sync::Arc},
};

const SUPPORTED_METHODS: &[&str] = &[
    "eth_sendTransaction",
    "eth_signTransaction",
    "eth_sign",
    "personal_sign",
    "eth_signTypedData",
];
const SUPPORTED_CHAINS: &[&str] = &["eip155:1", "eip155:5"];
const SUPPORTED_EVENTS: &[&str] = &["chainChanged", "accountsChanged"];
const SUPPORTED_ACCOUNTS: &[&str] = &["eip155:5:0xBA5BA3955463ADcc7aa3E33bbdfb8A68e0933dD8"];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// A pairing URI obtained from a dApp (e.g. https://react-app.walletconnect.com/).
    pairing_uri: String,

    #[arg(short, long, default_value = "3cbaa32f8fbf3cdcc87d27ca1fa68069")]
    project_id: String,
}

fn wallet_metadata() -> Metadata {
    Metadata {
        name: "Rust session example wallet".to_owned(),
        description: "Demonstrates client_core::Client".to_owned(),
        url: "https://github.com/".to_owned(),
        icons: vec!["https://www.rust-lang.org/static/images/rust-logo-blk.svg".to_owned()],
    }
}

fn settle_namespaces_for(required: &ProposeNamespaces) -> SettleNamespaces {
    let mut map = BTreeMap::new();
    for (chain_namespace, namespace) in required.0.iter() {
        map.insert(
            chain_namespace.clone(),
            SettleNamespace {
                accounts: SUPPORTED_ACCOUNTS.iter().map(|a| a.to_string()).collect(),
                methods: namespace.methods.clone(),
                events: namespace.events.clone(),
                extensions: None,
            },
        );
    }
    SettleNamespaces(map)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let client = Client::new(Arc::new(MemoryStorage::new()), wallet_metadata(), false);
    client.init().await?;
    client.connect(ConnectionOptions::new(args.project_id)).await?;

    let settled_pairing = client.pair(&args.pairing_uri).await?;
    println!("pairing settled on topic={settled_pairing}");

    let mut events = client.events();
    loop {
        match events.recv().await {
            Ok(ClientEvent::SessionProposal { topic, id, proposal }) => {
                println!("session proposed on pairing {topic}: {proposal:?}");
                let namespaces = settle_namespaces_for(&proposal.required_namespaces);
                let settled_session = client.approve_session(id, &topic, &proposal, namespaces).await?;
                println!("session settled on topic={settled_session}");
            }
            Ok(ClientEvent::SessionRequest { topic, id: _, request }) => {
                println!(
                    "blockchain request on session {topic}: method={} params={}",
                    request.request.method, request.request.params
                );
            }
            Ok(ClientEvent::SessionDeleted { topic, reason }) => {
                println!("session {topic} closed: {reason:?}");
            }
            Ok(event) => println!("event: {event:?}"),
            Err(error) => {
                println!("event stream closed: {error}");
                break;
            }
        }
    }

    Ok(())
}

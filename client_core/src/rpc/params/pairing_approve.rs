//! Sent by the responder once it has derived the settled symmetric key and
//! topic, completing the Diffie-Hellman exchange started by the pairing URI.

use {
    super::{IrnMetadata, PairingState},
    serde::{Deserialize, Serialize},
};

pub(super) const IRN_REQUEST_METADATA: IrnMetadata = IrnMetadata {
    tag: 1000,
    ttl: 300,
    prompt: false,
};

pub(super) const IRN_RESPONSE_METADATA: IrnMetadata = IrnMetadata {
    tag: 1001,
    ttl: 300,
    prompt: false,
};

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PairingApproveRequest {
    pub responder_public_key: String,
    /// Unix timestamp the pairing is settled until.
    pub expiry: u64,
    pub state: PairingState,
}

#[cfg(test)]
mod tests {
    use super::{super::tests::param_serde_test, *};
    use anyhow::Result;

    #[test]
    fn test_serde_pairing_approve_request() -> Result<()> {
        let json = r#"
        {
            "responderPublicKey": "a3ad5e26070ddb2809200c6f56e739333512015bceeadbb8ea1731c4c7ddb207",
            "expiry": 1675734962,
            "state": {
                "metadata": {
                    "description": "React App for WalletConnect",
                    "url": "http://localhost:3000",
                    "icons": [
                        "https://avatars.githubusercontent.com/u/37784886"
                    ],
                    "name": "React App"
                }
            }
        }
        "#;

        param_serde_test::<PairingApproveRequest>(json)
    }
}

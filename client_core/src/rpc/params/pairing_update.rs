//! Propagates a shallow merge of pairing state (currently only `metadata`).

use {
    super::{IrnMetadata, PairingState},
    serde::{Deserialize, Serialize},
};

pub(super) const IRN_REQUEST_METADATA: IrnMetadata = IrnMetadata {
    tag: 1004,
    ttl: 86400,
    prompt: false,
};

pub(super) const IRN_RESPONSE_METADATA: IrnMetadata = IrnMetadata {
    tag: 1005,
    ttl: 86400,
    prompt: false,
};

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PairingUpdateRequest {
    pub state: PairingState,
}

#[cfg(test)]
mod tests {
    use super::{super::tests::param_serde_test, *};
    use anyhow::Result;

    #[test]
    fn test_serde_pairing_update_request() -> Result<()> {
        let json = r#"
        {
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

        param_serde_test::<PairingUpdateRequest>(json)
    }
}

//! Grants additional JSON-RPC methods/notification types over a settled
//! pairing. Monotonic: the engine unions these into the existing grant, it
//! never removes permissions.

use {
    super::{IrnMetadata, PairingPermissions},
    serde::{Deserialize, Serialize},
};

pub(super) const IRN_REQUEST_METADATA: IrnMetadata = IrnMetadata {
    tag: 1006,
    ttl: 86400,
    prompt: false,
};

pub(super) const IRN_RESPONSE_METADATA: IrnMetadata = IrnMetadata {
    tag: 1007,
    ttl: 86400,
    prompt: false,
};

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PairingUpgradeRequest {
    pub permissions: PairingPermissions,
}

#[cfg(test)]
mod tests {
    use super::{super::tests::param_serde_test, *};
    use anyhow::Result;

    #[test]
    fn test_serde_pairing_upgrade_request() -> Result<()> {
        let json = r#"
        {
            "permissions": {
                "jsonrpc": {
                    "methods": [
                        "wc_sessionPropose"
                    ]
                }
            }
        }
        "#;

        param_serde_test::<PairingUpgradeRequest>(json)
    }
}

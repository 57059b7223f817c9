//! Terminates a settled pairing and all sessions derived from it.

use {
    super::{IrnMetadata, Reason},
    serde::{Deserialize, Serialize},
};

pub(super) const IRN_REQUEST_METADATA: IrnMetadata = IrnMetadata {
    tag: 1008,
    ttl: 86400,
    prompt: false,
};

pub(super) const IRN_RESPONSE_METADATA: IrnMetadata = IrnMetadata {
    tag: 1009,
    ttl: 86400,
    prompt: false,
};

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PairingDeleteRequest {
    pub reason: Reason,
}

#[cfg(test)]
mod tests {
    use super::{super::tests::param_serde_test, *};
    use anyhow::Result;

    #[test]
    fn test_serde_pairing_delete_request() -> Result<()> {
        let json = r#"
        {
            "reason": {
                "code": 6000,
                "message": "User disconnected"
            }
        }
        "#;

        param_serde_test::<PairingDeleteRequest>(json)
    }
}

//! Sent by the responder instead of `approve` when it declines a proposed
//! pairing (e.g. `UNAUTHORIZED_MATCHING_CONTROLLER`).

use {
    super::{IrnMetadata, Reason},
    serde::{Deserialize, Serialize},
};

pub(super) const IRN_REQUEST_METADATA: IrnMetadata = IrnMetadata {
    tag: 1002,
    ttl: 300,
    prompt: false,
};

pub(super) const IRN_RESPONSE_METADATA: IrnMetadata = IrnMetadata {
    tag: 1003,
    ttl: 300,
    prompt: false,
};

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PairingRejectRequest {
    pub reason: Reason,
}

#[cfg(test)]
mod tests {
    use super::{super::tests::param_serde_test, *};
    use anyhow::Result;

    #[test]
    fn test_serde_pairing_reject_request() -> Result<()> {
        let json = r#"
        {
            "reason": {
                "code": 5000,
                "message": "Unauthorized matching controller"
            }
        }
        "#;

        param_serde_test::<PairingRejectRequest>(json)
    }
}

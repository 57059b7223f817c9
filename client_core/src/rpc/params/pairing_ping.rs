//! Liveness check over a settled pairing topic.

use {
    super::IrnMetadata,
    serde::{Deserialize, Serialize},
};

pub(super) const IRN_REQUEST_METADATA: IrnMetadata = IrnMetadata {
    tag: 1012,
    ttl: 30,
    prompt: false,
};

pub(super) const IRN_RESPONSE_METADATA: IrnMetadata = IrnMetadata {
    tag: 1013,
    ttl: 30,
    prompt: false,
};

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PairingPingRequest {}

#[cfg(test)]
mod tests {
    use super::{super::tests::param_serde_test, *};
    use anyhow::Result;

    #[test]
    fn test_serde_pairing_ping_request() -> Result<()> {
        let json = r#"{}"#;

        param_serde_test::<PairingPingRequest>(json)
    }
}

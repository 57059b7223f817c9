//! Out-of-band notification delivered over a settled pairing topic, gated by
//! the notification permissions granted in `upgrade`.

use {super::IrnMetadata, serde::{Deserialize, Serialize}, serde_json::Value};

pub(super) const IRN_REQUEST_METADATA: IrnMetadata = IrnMetadata {
    tag: 1014,
    ttl: 300,
    prompt: true,
};

pub(super) const IRN_RESPONSE_METADATA: IrnMetadata = IrnMetadata {
    tag: 1015,
    ttl: 300,
    prompt: false,
};

#[derive(Debug, Serialize, PartialEq, Eq, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PairingNotificationRequest {
    pub r#type: String,
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::{super::tests::param_serde_test, *};
    use anyhow::Result;

    #[test]
    fn test_serde_pairing_notification_request() -> Result<()> {
        let json = r#"
        {
            "type": "accountsChanged",
            "data": ["0xab16a96D359eC26a11e2C2b3d8f8B8942d5Bfcdb"]
        }
        "#;

        param_serde_test::<PairingNotificationRequest>(json)
    }
}

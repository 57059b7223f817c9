//! Forwards an opaque JSON-RPC request/response over a settled pairing
//! topic. Used to carry `wc_sessionPropose` (and its response) from the
//! pairing topic into the session namespace once a pairing is settled.

use {super::IrnMetadata, serde_json::Value};

pub(super) const IRN_REQUEST_METADATA: IrnMetadata = IrnMetadata {
    tag: 1010,
    ttl: 300,
    prompt: true,
};

pub(super) const IRN_RESPONSE_METADATA: IrnMetadata = IrnMetadata {
    tag: 1011,
    ttl: 300,
    prompt: false,
};

pub type PairingPayloadRequest = Value;

#[cfg(test)]
mod tests {
    use super::{super::tests::param_serde_test, *};
    use anyhow::Result;

    #[test]
    fn test_serde_pairing_payload_request() -> Result<()> {
        let json = r#"{"method":"wc_sessionPropose","params":{}}"#;

        param_serde_test::<PairingPayloadRequest>(json)
    }
}

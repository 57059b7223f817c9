pub(super) mod pairing_approve;
pub(super) mod pairing_delete;
pub(super) mod pairing_notification;
pub(super) mod pairing_payload;
pub(super) mod pairing_ping;
pub(super) mod pairing_reject;
pub(super) mod pairing_update;
pub(super) mod pairing_upgrade;
pub(super) mod session_delete;
pub(super) mod session_event;
pub(super) mod session_extend;
pub(super) mod session_ping;
pub(super) mod session_propose;
pub(super) mod session_request;
pub(super) mod session_settle;
pub(super) mod session_update;
pub(super) mod shared_types;

pub use {
    pairing_approve::*, pairing_delete::*, pairing_notification::*, pairing_payload::*,
    pairing_ping::*, pairing_reject::*, pairing_update::*, pairing_upgrade::*, session_delete::*,
    session_event::*, session_extend::*, session_ping::*, session_propose::*, session_request::*,
    session_settle::*, session_update::*, shared_types::*,
};

use {
    paste::paste,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::result::Result,
};

/// Errors covering Sign API payload parameter conversion issues.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    /// Sign API serialization/deserialization issues.
    #[error("Failure serializing/deserializing Sign API parameters: {0}")]
    Serde(#[from] serde_json::Error),
    /// Sign API invalid response tag.
    #[error("Response tag={0} does not match any of the Sign API methods")]
    ResponseTag(u32),
}

/// Relay protocol metadata.
///
///  https://specs.walletconnect.com/2.0/specs/clients/sign/rpc-methods
pub trait RelayProtocolMetadata {
    /// Retrieves IRN relay protocol metadata.
    ///
    /// Every method must return corresponding IRN metadata.
    fn irn_metadata(&self) -> IrnMetadata;
}

pub trait RelayProtocolHelpers {
    type Params;

    /// Converts "unnamed" payload parameters into typed.
    ///
    /// Example: success and error response payload does not specify the
    /// method. Thus the only way to deserialize the data into typed
    /// parameters, is to use the tag to determine the response method.
    ///
    /// This is a convenience method, so that users don't have to deal
    /// with the tags directly.
    fn irn_try_from_tag(value: Value, tag: u32) -> Result<Self::Params, ParamsError>;
}

/// Relay IRN protocol metadata.
///
/// https://specs.walletconnect.com/2.0/specs/servers/relay/relay-server-rpc
/// #definitions
#[derive(Debug, Clone, Copy)]
pub struct IrnMetadata {
    pub tag: u32,
    pub ttl: u64,
    pub prompt: bool,
}

// Convenience macro to de-duplicate implementation for different parameter
// sets, generalized over the full pairing+session method table so adding a
// namespace only means adding entries here.
macro_rules! impl_relay_protocol_metadata {
    ($param_type:ty, $meta:ident, { $($module:ident => $variant:ident),+ $(,)? }) => {
        paste! {
            impl RelayProtocolMetadata for $param_type {
                fn irn_metadata(&self) -> IrnMetadata {
                    match self {
                        $(Self::$variant(_) => $module::[<IRN_ $meta:upper _METADATA>],)+
                    }
                }
            }
        }
    }
}

// Convenience macro to de-duplicate implementation for different parameter sets.
macro_rules! impl_relay_protocol_helpers {
    ($param_type:ty, { $($module:ident => $variant:ident),+ $(,)? }) => {
        impl RelayProtocolHelpers for $param_type {
            type Params = Self;

            fn irn_try_from_tag(value: Value, tag: u32) -> Result<Self::Params, ParamsError> {
                $(
                    if tag == $module::IRN_RESPONSE_METADATA.tag {
                        return Ok(Self::$variant(serde_json::from_value(value)?));
                    }
                )+
                Err(ParamsError::ResponseTag(tag))
            }
        }
    };
}

/// Sign API request parameters.
///
/// https://specs.walletconnect.com/2.0/specs/clients/sign/rpc-methods
/// https://specs.walletconnect.com/2.0/specs/clients/sign/data-structures
#[derive(Debug, Serialize, Eq, Deserialize, Clone, PartialEq)]
#[serde(tag = "method", content = "params")]
pub enum RequestParams {
    #[serde(rename = "wc_sessionPropose")]
    SessionPropose(SessionProposeRequest),
    #[serde(rename = "wc_sessionSettle")]
    SessionSettle(SessionSettleRequest),
    #[serde(rename = "wc_sessionUpdate")]
    SessionUpdate(SessionUpdateRequest),
    #[serde(rename = "wc_sessionExtend")]
    SessionExtend(SessionExtendRequest),
    #[serde(rename = "wc_sessionRequest")]
    SessionRequest(SessionRequestRequest),
    #[serde(rename = "wc_sessionEvent")]
    SessionEvent(SessionEventRequest),
    #[serde(rename = "wc_sessionDelete")]
    SessionDelete(SessionDeleteRequest),
    #[serde(rename = "wc_sessionPing")]
    SessionPing(()),
    #[serde(rename = "wc_pairingApprove")]
    PairingApprove(PairingApproveRequest),
    #[serde(rename = "wc_pairingReject")]
    PairingReject(PairingRejectRequest),
    #[serde(rename = "wc_pairingUpdate")]
    PairingUpdate(PairingUpdateRequest),
    #[serde(rename = "wc_pairingUpgrade")]
    PairingUpgrade(PairingUpgradeRequest),
    #[serde(rename = "wc_pairingDelete")]
    PairingDelete(PairingDeleteRequest),
    #[serde(rename = "wc_pairingPayload")]
    PairingPayload(PairingPayloadRequest),
    #[serde(rename = "wc_pairingPing")]
    PairingPing(()),
    #[serde(rename = "wc_pairingNotification")]
    PairingNotification(PairingNotificationRequest),
}
impl_relay_protocol_metadata!(RequestParams, request, {
    session_propose => SessionPropose,
    session_settle => SessionSettle,
    session_update => SessionUpdate,
    session_extend => SessionExtend,
    session_request => SessionRequest,
    session_event => SessionEvent,
    session_delete => SessionDelete,
    session_ping => SessionPing,
    pairing_approve => PairingApprove,
    pairing_reject => PairingReject,
    pairing_update => PairingUpdate,
    pairing_upgrade => PairingUpgrade,
    pairing_delete => PairingDelete,
    pairing_payload => PairingPayload,
    pairing_ping => PairingPing,
    pairing_notification => PairingNotification,
});

/// https://www.jsonrpc.org/specification#response_object
///
/// JSON RPC 2.0 response object can either carry success or error data.
/// Please note, that relay protocol metadata is used to disambiguate the
/// response data.
///
/// For example:
/// `RelayProtocolHelpers::irn_try_from_tag` is used to deserialize an opaque
/// response data into the typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseParams {
    /// A response with a result.
    #[serde(rename = "result")]
    Success(Value),

    /// A response for a failed request.
    #[serde(rename = "error")]
    Err(Value),
}

/// Typed success response parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseParamsSuccess {
    SessionPropose(SessionProposeResponse),
    SessionSettle(bool),
    SessionUpdate(bool),
    SessionExtend(bool),
    SessionRequest(bool),
    SessionEvent(bool),
    SessionDelete(bool),
    SessionPing(bool),
    PairingApprove(bool),
    PairingReject(bool),
    PairingUpdate(bool),
    PairingUpgrade(bool),
    PairingDelete(bool),
    PairingPayload(Value),
    PairingPing(bool),
    PairingNotification(bool),
}

impl_relay_protocol_metadata!(ResponseParamsSuccess, response, {
    session_propose => SessionPropose,
    session_settle => SessionSettle,
    session_update => SessionUpdate,
    session_extend => SessionExtend,
    session_request => SessionRequest,
    session_event => SessionEvent,
    session_delete => SessionDelete,
    session_ping => SessionPing,
    pairing_approve => PairingApprove,
    pairing_reject => PairingReject,
    pairing_update => PairingUpdate,
    pairing_upgrade => PairingUpgrade,
    pairing_delete => PairingDelete,
    pairing_payload => PairingPayload,
    pairing_ping => PairingPing,
    pairing_notification => PairingNotification,
});
impl_relay_protocol_helpers!(ResponseParamsSuccess, {
    session_propose => SessionPropose,
    session_settle => SessionSettle,
    session_update => SessionUpdate,
    session_extend => SessionExtend,
    session_request => SessionRequest,
    session_event => SessionEvent,
    session_delete => SessionDelete,
    session_ping => SessionPing,
    pairing_approve => PairingApprove,
    pairing_reject => PairingReject,
    pairing_update => PairingUpdate,
    pairing_upgrade => PairingUpgrade,
    pairing_delete => PairingDelete,
    pairing_payload => PairingPayload,
    pairing_ping => PairingPing,
    pairing_notification => PairingNotification,
});

impl TryFrom<ResponseParamsSuccess> for ResponseParams {
    type Error = ParamsError;

    fn try_from(value: ResponseParamsSuccess) -> Result<Self, Self::Error> {
        Ok(Self::Success(serde_json::to_value(value)?))
    }
}

/// Response error data.
///
/// The documentation states that both fields are required.
/// However, on session expiry error, "empty" error is received.
#[derive(Debug, Clone, Eq, Serialize, Deserialize, PartialEq)]
pub struct ErrorParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub code: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub message: Option<String>,
}

/// Typed error response parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseParamsError {
    SessionPropose(ErrorParams),
    SessionSettle(ErrorParams),
    SessionUpdate(ErrorParams),
    SessionExtend(ErrorParams),
    SessionRequest(ErrorParams),
    SessionEvent(ErrorParams),
    SessionDelete(ErrorParams),
    SessionPing(ErrorParams),
    PairingApprove(ErrorParams),
    PairingReject(ErrorParams),
    PairingUpdate(ErrorParams),
    PairingUpgrade(ErrorParams),
    PairingDelete(ErrorParams),
    PairingPayload(ErrorParams),
    PairingPing(ErrorParams),
    PairingNotification(ErrorParams),
}
impl_relay_protocol_metadata!(ResponseParamsError, response, {
    session_propose => SessionPropose,
    session_settle => SessionSettle,
    session_update => SessionUpdate,
    session_extend => SessionExtend,
    session_request => SessionRequest,
    session_event => SessionEvent,
    session_delete => SessionDelete,
    session_ping => SessionPing,
    pairing_approve => PairingApprove,
    pairing_reject => PairingReject,
    pairing_update => PairingUpdate,
    pairing_upgrade => PairingUpgrade,
    pairing_delete => PairingDelete,
    pairing_payload => PairingPayload,
    pairing_ping => PairingPing,
    pairing_notification => PairingNotification,
});
impl_relay_protocol_helpers!(ResponseParamsError, {
    session_propose => SessionPropose,
    session_settle => SessionSettle,
    session_update => SessionUpdate,
    session_extend => SessionExtend,
    session_request => SessionRequest,
    session_event => SessionEvent,
    session_delete => SessionDelete,
    session_ping => SessionPing,
    pairing_approve => PairingApprove,
    pairing_reject => PairingReject,
    pairing_update => PairingUpdate,
    pairing_upgrade => PairingUpgrade,
    pairing_delete => PairingDelete,
    pairing_payload => PairingPayload,
    pairing_ping => PairingPing,
    pairing_notification => PairingNotification,
});

impl TryFrom<ResponseParamsError> for ResponseParams {
    type Error = ParamsError;

    fn try_from(value: ResponseParamsError) -> Result<Self, Self::Error> {
        Ok(Self::Err(serde_json::to_value(value)?))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use anyhow::Result;
    use serde::de::DeserializeOwned;
    use serde_json;

    /// Trims json of the whitespaces and newlines.
    ///
    /// Allows to use "pretty json" in unittest, and still get consistent
    /// results post serialization/deserialization.
    pub fn param_json_trim(json: &str) -> String {
        json.chars()
            .filter(|c| !c.is_whitespace() && *c != '\n')
            .collect::<String>()
    }

    /// Tests input json serialization/deserialization into the specified type.
    pub fn param_serde_test<T>(json: &str) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let expected = param_json_trim(json);
        let deserialized: T = serde_json::from_str(&expected)?;
        let actual = serde_json::to_string(&deserialized)?;

        assert_eq!(expected, actual);

        Ok(())
    }
}

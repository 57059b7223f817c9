//! The pairing URI: the out-of-band signal (QR code or deep link) that
//! boots the whole protocol, carrying the proposer's topic, public key,
//! controller flag, and relay descriptor before any shared key exists.
//!
//! https://specs.walletconnect.com/2.0/specs/clients/core/pairing/pairing-uri

use {
    crate::rpc::Relay,
    regex::Regex,
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
    url::Url,
};

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("Expecting protocol \"wc\" but \"{protocol}\" is found.")]
    UnexpectedProtocol { protocol: String },
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("Failed to parse topic and version")]
    InvalidTopicAndVersion,
    #[error("Topic not found")]
    TopicNotFound,
    #[error("Version not found")]
    VersionNotFound,
    #[error("Controller flag not found")]
    ControllerNotFound,
    #[error("Controller flag must be \"0\" or \"1\", found {0:?}")]
    InvalidController(String),
    #[error("Public key not found")]
    PublicKeyNotFound,
    #[error("Failed to parse public key: {0:?}")]
    InvalidPublicKey(#[from] hex::FromHexError),
    #[error("Relay descriptor not found")]
    RelayNotFound,
    #[error("Failed to parse relay descriptor: {0}")]
    InvalidRelay(serde_json::Error),
    #[error("Unexpected parameter, key: {0:?}, value: {1:?}")]
    UnexpectedParameter(String, String),
}

pub const VERSION: &str = "2";

/// A parsed pairing URI: `wc:{topic}@{version}?controller={0|1}&publicKey={hex}&relay={urlencoded-JSON}`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pairing {
    pub topic: String,
    pub version: String,
    pub controller: bool,
    pub public_key: String,
    pub relay: Relay,
}

impl Pairing {
    /// Builds the proposer's pairing URI for a freshly generated keypair.
    pub fn new(topic: impl Into<String>, controller: bool, public_key: impl Into<String>, relay: Relay) -> Self {
        Self {
            topic: topic.into(),
            version: VERSION.to_owned(),
            controller,
            public_key: public_key.into(),
            relay,
        }
    }

    fn parse_topic_and_version(path: &str) -> Result<(String, String), ParseError> {
        let caps = Regex::new(r"^(?P<topic>[[:word:]-]+)@(?P<version>\d+)$")
            .expect("invalid regex")
            .captures(path)
            .ok_or(ParseError::InvalidTopicAndVersion)?;
        let topic = caps
            .name("topic")
            .ok_or(ParseError::TopicNotFound)?
            .as_str()
            .to_owned();
        let version = caps
            .name("version")
            .ok_or(ParseError::VersionNotFound)?
            .as_str()
            .to_owned();
        Ok((topic, version))
    }
}

impl Display for Pairing {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let relay_json = serde_json::to_string(&self.relay).unwrap_or_default();
        write!(
            f,
            "wc:{}@{}?controller={}&publicKey={}&relay={}",
            self.topic,
            self.version,
            self.controller as u8,
            self.public_key,
            url::form_urlencoded::byte_serialize(relay_json.as_bytes()).collect::<String>(),
        )
    }
}

impl FromStr for Pairing {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::from_str(s)?;

        if url.scheme() != "wc" {
            return Err(ParseError::UnexpectedProtocol {
                protocol: url.scheme().to_owned(),
            });
        }

        let (topic, version) = Self::parse_topic_and_version(url.path())?;

        let mut controller: Option<bool> = None;
        let mut public_key: Option<String> = None;
        let mut relay: Option<Relay> = None;
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                "controller" => {
                    controller = Some(match v.as_ref() {
                        "0" => false,
                        "1" => true,
                        other => return Err(ParseError::InvalidController(other.to_owned())),
                    })
                }
                "publicKey" => {
                    hex::decode(v.as_ref())?;
                    public_key = Some(v.into_owned());
                }
                "relay" => {
                    relay = Some(serde_json::from_str(&v).map_err(ParseError::InvalidRelay)?)
                }
                _ => return Err(ParseError::UnexpectedParameter(k.into_owned(), v.into_owned())),
            }
        }

        Ok(Self {
            topic,
            version,
            controller: controller.ok_or(ParseError::ControllerNotFound)?,
            public_key: public_key.ok_or(ParseError::PublicKeyNotFound)?,
            relay: relay.ok_or(ParseError::RelayNotFound)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format_round_trip() {
        let uri = Pairing::new(
            "c9e6d30fb34afe70a15c14e9337ba8e4d5a35dd695c39b94884b0ee60c69d168",
            true,
            "7ff3e362f825ab868e20e767fe580d0311181632707e7c878cbeca0238d45b8",
            Relay {
                protocol: "waku".to_owned(),
                data: None,
            },
        );

        let formatted = uri.to_string();
        let parsed = Pairing::from_str(&formatted).unwrap();

        assert_eq!(parsed, uri);
    }

    #[test]
    fn rejects_non_wc_scheme() {
        let err = Pairing::from_str("https://example.com").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedProtocol { .. }));
    }

    #[test]
    fn rejects_missing_controller() {
        let uri = "wc:c9e6d30fb34afe70a15c14e9337ba8e4d5a35dd695c39b94884b0ee60c69d168@2?publicKey=7ff3e362f825ab868e20e767fe580d0311181632707e7c878cbeca0238d45b8&relay=%7B%22protocol%22%3A%22waku%22%7D";
        assert_eq!(Pairing::from_str(uri), Err(ParseError::ControllerNotFound));
    }
}

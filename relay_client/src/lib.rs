pub use {client::*, errors::*};
use {
    relay_rpc::domain::ProjectId,
    serde::Serialize,
    tokio_tungstenite::tungstenite::{client::IntoClientRequest, http},
};

mod client;
mod errors;

/// Default relay address, used when [`ConnectionOptions`] doesn't override it.
pub const DEFAULT_RELAY_ADDRESS: &str = "wss://relay.walletconnect.com";

/// Relay connection options.
///
/// Relay authentication (JWT/CACAO identity proofs) is out of scope here; the
/// relay is expected to be reachable without per-client auth tokens.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// The Relay websocket address. The default address is
    /// `wss://relay.walletconnect.com`.
    pub address: String,

    /// The project-specific identifier used to scope usage on the relay.
    pub project_id: ProjectId,

    /// Optional origin of the request. Subject to allow-list validation.
    pub origin: Option<String>,
}

impl ConnectionOptions {
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self {
            address: DEFAULT_RELAY_ADDRESS.into(),
            project_id: project_id.into(),
            origin: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<Option<String>>) -> Self {
        self.origin = origin.into();
        self
    }

    fn into_request(self) -> Result<http::Request<()>, Error> {
        let ConnectionOptions {
            address,
            project_id,
            origin,
        } = self;

        let query = {
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            struct QueryParams {
                project_id: ProjectId,
            }

            serde_qs::to_string(&QueryParams { project_id }).map_err(RequestBuildError::Query)?
        };

        let mut request = format!("{address}/?{query}")
            .into_client_request()
            .map_err(RequestBuildError::Other)?;

        if let Some(origin) = &origin {
            let value = origin.parse().map_err(|_| RequestBuildError::Headers)?;
            request.headers_mut().append("Origin", value);
        }

        Ok(request)
    }
}

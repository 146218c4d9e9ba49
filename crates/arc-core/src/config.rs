// ── Runtime connection configuration ──
//
// Describes which backend to talk to and how long to wait for it.
// Never touches disk: the CLI builds a `ClientConfig` and hands it in.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use strum::IntoEnumIterator;
use url::Url;

use arc_api::{MockBackend, RpcClient, ScriptBackend, TransportConfig};

use crate::model::ResourceName;

/// Where RPCs go.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// The deployed script endpoint.
    Script {
        url: Url,
        access_token: Option<SecretString>,
    },
    /// An in-process mock with one empty table per resource.
    Mock { latency: Duration },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    /// Upper bound on one RPC, after which it fails with "Server is not responding".
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Mock {
                latency: Duration::from_millis(300),
            },
            timeout: arc_api::rpc::DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn mock() -> Self {
        Self::default()
    }

    pub fn script(url: Url) -> Self {
        Self {
            backend: BackendConfig::Script {
                url,
                access_token: None,
            },
            ..Self::default()
        }
    }

    /// Build the RPC client for this configuration.
    pub fn build_rpc(&self) -> Result<RpcClient, arc_api::Error> {
        let client = match &self.backend {
            BackendConfig::Script { url, access_token } => {
                let mut transport = TransportConfig {
                    // The RPC timer is authoritative; keep the HTTP one looser.
                    timeout: self.timeout + Duration::from_secs(1),
                    ..TransportConfig::default()
                };
                if let Some(token) = access_token {
                    transport = transport.with_access_token(token.clone());
                }
                RpcClient::new(ScriptBackend::new(url.clone(), &transport)?)
            }
            BackendConfig::Mock { latency } => {
                let mock = MockBackend::new(ResourceName::iter().map(|n| n.to_string()))
                    .with_latency(*latency);
                RpcClient::from_arc(Arc::new(mock))
            }
        };
        Ok(client.with_timeout(self.timeout))
    }
}
